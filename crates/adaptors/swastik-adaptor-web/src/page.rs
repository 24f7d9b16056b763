//! Chat page served at `/`

const TEMPLATE: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>SWASTIK - Orchestration Copilot</title>
  <style>
    :root {
      --bg: #f8fafc;
      --card: #ffffff;
      --primary: #4f46e5;
      --text: #1e293b;
      --muted: #64748b;
      --border: rgba(0,0,0,0.08);
      --danger: #ef4444;
      --warning: #f59e0b;
      --ok: #10b981;
    }
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: var(--bg);
      color: var(--text);
      height: 100vh;
      display: flex;
      flex-direction: column;
    }
    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      padding: 14px 20px;
      background: var(--card);
      border-bottom: 1px solid var(--border);
    }
    .brand { font-weight: 700; font-size: 18px; }
    .brand small { font-weight: 400; color: var(--muted); margin-left: 8px; }
    .mode {
      font-size: 12px;
      font-weight: 600;
      padding: 3px 10px;
      border-radius: 12px;
      background: rgba(16,185,129,0.12);
      color: #047857;
    }
    .mode.secondary { background: rgba(245,158,11,0.15); color: #b45309; }
    .mode.offline { background: rgba(239,68,68,0.12); color: #b91c1c; }
    header button {
      margin-left: 12px;
      border: 1px solid var(--border);
      background: transparent;
      border-radius: 8px;
      padding: 4px 10px;
      cursor: pointer;
      color: var(--muted);
    }
    #banner {
      display: none;
      padding: 10px 20px;
      background: var(--danger);
      color: white;
      font-size: 14px;
    }
    #messages {
      flex: 1;
      overflow-y: auto;
      padding: 20px;
      display: flex;
      flex-direction: column;
      gap: 12px;
    }
    .msg {
      max-width: 720px;
      padding: 10px 14px;
      border-radius: 12px;
      background: var(--card);
      border: 1px solid var(--border);
      white-space: pre-wrap;
      line-height: 1.45;
    }
    .msg.user { align-self: flex-end; background: var(--primary); color: white; border: none; }
    .meta { font-size: 11px; color: var(--muted); margin-bottom: 4px; }
    .msg.user .meta { color: rgba(255,255,255,0.75); }
    .typing { color: var(--muted); font-style: italic; }
    form {
      display: flex;
      gap: 10px;
      padding: 14px 20px;
      background: var(--card);
      border-top: 1px solid var(--border);
    }
    textarea {
      flex: 1;
      resize: none;
      height: 44px;
      padding: 10px 12px;
      border: 1px solid var(--border);
      border-radius: 10px;
      font: inherit;
    }
    #send {
      padding: 0 20px;
      border: none;
      border-radius: 10px;
      background: var(--primary);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }
    #send:disabled { opacity: 0.5; cursor: default; }
    #logs {
      display: none;
      height: 160px;
      overflow-y: auto;
      font: 12px ui-monospace, monospace;
      background: #0f172a;
      color: #cbd5e1;
      padding: 8px 12px;
    }
  </style>
</head>
<body>
  <header>
    <div class="brand">SWASTIK<small>orchestration copilot</small></div>
    <div>
      <span id="mode" class="mode">primary</span>
      <button id="reset" type="button" title="Start a new conversation">New chat</button>
    </div>
  </header>
  <div id="banner"></div>
  <div id="messages"></div>
  <div id="logs"></div>
  <form id="composer">
    <textarea id="input" placeholder="Describe the customer issue..." autofocus></textarea>
    <button id="send" type="submit">Send</button>
  </form>
  <script>
    const LOGS_ENABLED = {LOGS_ENABLED};
    const list = document.getElementById('messages');
    const input = document.getElementById('input');
    const send = document.getElementById('send');
    const banner = document.getElementById('banner');
    const modeEl = document.getElementById('mode');
    let loading = false;
    let bannerTimer = null;

    function showError(text) {
      banner.textContent = text;
      banner.style.display = 'block';
      clearTimeout(bannerTimer);
      bannerTimer = setTimeout(() => { banner.style.display = 'none'; }, 5000);
    }

    function setMode(mode) {
      modeEl.textContent = mode;
      modeEl.className = 'mode ' + mode;
    }

    function append(msg) {
      const el = document.createElement('div');
      el.className = 'msg ' + msg.role;
      const meta = document.createElement('div');
      meta.className = 'meta';
      const who = msg.role === 'user' ? 'You' : 'SWASTIK' + (msg.backend ? ' (' + msg.backend + ')' : '');
      meta.textContent = who + ' · ' + msg.timestamp;
      const body = document.createElement('div');
      body.textContent = msg.content;
      el.appendChild(meta);
      el.appendChild(body);
      list.appendChild(el);
      list.scrollTop = list.scrollHeight;
      return el;
    }

    function render(messages) {
      list.innerHTML = '';
      messages.forEach(append);
    }

    async function load() {
      const res = await fetch('/api/messages');
      if (!res.ok) { showError('Could not load conversation'); return; }
      const data = await res.json();
      render(data.messages);
      setMode(data.mode);
    }

    function setLoading(on) {
      loading = on;
      send.disabled = on;
    }

    async function submit() {
      const text = input.value.trim();
      if (!text || loading) return;
      setLoading(true);
      input.value = '';
      const pending = append({ role: 'user', content: text, timestamp: '...' });
      const typing = document.createElement('div');
      typing.className = 'typing';
      typing.textContent = 'SWASTIK is thinking...';
      list.appendChild(typing);
      list.scrollTop = list.scrollHeight;
      try {
        const res = await fetch('/api/chat', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ text })
        });
        typing.remove();
        pending.remove();
        if (res.status === 409) { showError('Still waiting for the previous reply'); input.value = text; return; }
        if (!res.ok) {
          const err = await res.json().catch(() => ({}));
          showError(err.error || ('Request failed (' + res.status + ')'));
          input.value = text;
          return;
        }
        const data = await res.json();
        append(data.user);
        append(data.reply);
        setMode(data.mode);
      } catch (e) {
        typing.remove();
        pending.remove();
        input.value = text;
        showError('Network error: ' + e.message);
      } finally {
        setLoading(false);
        input.focus();
      }
    }

    document.getElementById('composer').addEventListener('submit', (e) => { e.preventDefault(); submit(); });
    input.addEventListener('keydown', (e) => {
      if (e.key === 'Enter' && !e.shiftKey) { e.preventDefault(); submit(); }
    });
    document.getElementById('reset').addEventListener('click', async () => {
      if (loading) return;
      const res = await fetch('/api/reset', { method: 'POST' });
      if (!res.ok) { showError('Could not reset the conversation'); return; }
      const data = await res.json();
      render(data.messages);
      setMode(data.mode);
    });

    if (LOGS_ENABLED) {
      const logs = document.getElementById('logs');
      logs.style.display = 'block';
      const es = new EventSource('/logs');
      es.onmessage = (ev) => {
        try {
          const e = JSON.parse(ev.data);
          const line = document.createElement('div');
          line.textContent = '[' + e.level + '] ' + e.target + ': ' + e.message;
          logs.appendChild(line);
          while (logs.childNodes.length > 500) logs.removeChild(logs.firstChild);
          logs.scrollTop = logs.scrollHeight;
        } catch (_) {}
      };
    }

    load();
  </script>
</body>
</html>
"##;

/// Render the chat page
pub fn render(logs_enabled: bool) -> String {
    TEMPLATE.replace("{LOGS_ENABLED}", if logs_enabled { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_flag_is_substituted() {
        assert!(render(true).contains("const LOGS_ENABLED = true;"));
        let page = render(false);
        assert!(page.contains("const LOGS_ENABLED = false;"));
        assert!(!page.contains("{LOGS_ENABLED}"));
    }
}
