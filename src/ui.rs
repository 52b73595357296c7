use crate::config::ConsoleConfig;
use crate::models::{MonthlyRevenue, RevenueSummary, UserDetail};
use crate::views::{
    ConsoleViews, Panel, ShellState, Tab, UsersPanel, ACK_DURATION, LOGIN_REDIRECT_DELAY,
};
use chrono::{DateTime, Datelike, Local, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

pub const BRAND: &str = "Leads Solution";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const FIELDS_REQUIRED: &str = "Email and password are required";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";
pub const LOGIN_SUCCESS: &str = "Login successful! Redirecting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner<'a> {
    Error(&'a str),
    Success(&'a str),
}

pub struct LoginPage<'a> {
    pub email: &'a str,
    pub banner: Option<Banner<'a>>,
}

pub struct ShellPage<'a> {
    pub shell: ShellState,
    pub display_name: &'a str,
    pub views: &'a ConsoleViews,
    pub ack: bool,
}

/// Currency and date conventions of the deployment.
pub struct Formats<'a> {
    pub currency_symbol: &'a str,
    pub date_format: &'a str,
}

impl<'a> Formats<'a> {
    pub fn from_config(config: &'a ConsoleConfig) -> Self {
        Self {
            currency_symbol: &config.currency_symbol,
            date_format: &config.date_format,
        }
    }

    pub fn amount(&self, value: f64) -> String {
        format!("{}{}", self.currency_symbol, value)
    }

    /// Falls back to RFC 3339 when the configured format is not valid strftime.
    pub fn date(&self, value: &DateTime<Utc>) -> String {
        let mut out = String::new();
        let local = value.with_timezone(&Local);
        if write!(out, "{}", local.format(self.date_format)).is_err() {
            return value.to_rfc3339();
        }
        out
    }
}

pub fn render_login(page: &LoginPage<'_>) -> String {
    let (banner, head) = match page.banner {
        Some(Banner::Error(message)) => (
            format!(r#"<div class="banner error" role="alert">{}</div>"#, encode_text(message)),
            String::new(),
        ),
        Some(Banner::Success(message)) => (
            format!(r#"<div class="banner success" role="status">&#10003; {}</div>"#, encode_text(message)),
            format!(
                r#"<meta http-equiv="refresh" content="{};url=/dashboard" />"#,
                LOGIN_REDIRECT_DELAY.as_secs()
            ),
        ),
        None => (String::new(), String::new()),
    };

    page_html("Sign in", &head, "login-body", &LOGIN_HTML
        .replace("{{BRAND}}", BRAND)
        .replace("{{BANNER}}", &banner)
        .replace("{{EMAIL}}", &encode_double_quoted_attribute(page.email))
        .replace("{{FOOTER}}", &footer()))
}

pub fn render_shell(page: &ShellPage<'_>, formats: &Formats<'_>) -> String {
    let shell = page.shell;
    let content = match shell.active_tab {
        Tab::Dashboard => render_dashboard_tab(&page.views.revenue, page.ack, shell, formats),
        Tab::Users => render_users_tab(&page.views.users, page.ack, shell, formats),
    };

    let nav_item = |tab: Tab, label: &str| {
        let class = if shell.active_tab == tab { "nav-item active" } else { "nav-item" };
        format!(
            r#"<a class="{class}" href="{}">{label}</a>"#,
            shell.with_tab(tab).href()
        )
    };
    let sidebar_class = if shell.sidebar_open { "sidebar open" } else { "sidebar closed" };
    let open_sidebar = if shell.sidebar_open {
        String::new()
    } else {
        format!(
            r#"<a class="icon-button" href="{}" aria-label="Open sidebar">&#9776;</a>"#,
            shell.with_sidebar_toggled().href()
        )
    };

    page_html("Dashboard", "", "shell-body", &SHELL_HTML
        .replace("{{SIDEBAR_CLASS}}", sidebar_class)
        .replace("{{BRAND}}", BRAND)
        .replace("{{CLOSE_SIDEBAR}}", &shell.with_sidebar_toggled().href())
        .replace("{{NAV_DASHBOARD}}", &nav_item(Tab::Dashboard, "Dashboard"))
        .replace("{{NAV_USERS}}", &nav_item(Tab::Users, "Users"))
        .replace("{{OPEN_SIDEBAR}}", &open_sidebar)
        .replace("{{DISPLAY_NAME}}", &encode_text(page.display_name))
        .replace("{{CONTENT}}", &content)
        .replace("{{FOOTER}}", &footer()))
}

pub fn render_dashboard_tab(
    panel: &Panel<RevenueSummary>,
    ack: bool,
    shell: ShellState,
    formats: &Formats<'_>,
) -> String {
    let (total_revenue, total_users, months) = match panel.snapshot() {
        Some(summary) => (summary.total_revenue, summary.total_users, summary.monthly_revenue.as_slice()),
        None => (0.0, 0, &[][..]),
    };

    format!(
        r#"<section class="tab-view" aria-label="Dashboard overview">
  <div class="view-header">
    <h2>Dashboard Overview</h2>
    {refresh}
  </div>
  {notice}
  <div class="cards">
    <div class="card metric"><span class="label">Total Revenue</span><span class="value" id="total-revenue">{revenue}</span></div>
    <div class="card metric"><span class="label">Total Users</span><span class="value" id="total-users">{users}</span></div>
  </div>
  <div class="card chart-card">
    <h3>Monthly Revenue</h3>
    {chart}
  </div>
</section>"#,
        refresh = refresh_control(
            &format!("/dashboard/refresh{}", query_suffix(shell)),
            "Refresh data",
            panel.is_busy(),
            ack.then_some("Data refreshed!"),
        ),
        notice = notice(panel.notice()),
        revenue = encode_text(&formats.amount(total_revenue)),
        users = total_users,
        chart = render_bar_chart(months, formats),
    )
}

pub fn render_users_tab(
    users: &UsersPanel,
    ack: bool,
    shell: ShellState,
    formats: &Formats<'_>,
) -> String {
    let roster = &users.roster;
    if !roster.has_responded() {
        return r#"<section class="tab-view"><div class="loading" role="status"><div class="spinner"></div><span>Loading users...</span></div></section>"#.to_string();
    }

    let rows = match roster.snapshot() {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|user| {
                format!(
                    r#"<tr class="user-row"><td>{id}</td><td>{email}</td><td class="actions"><a class="link" href="/dashboard/users/{href}{query}">View Details</a></td></tr>"#,
                    id = encode_text(&user.user_id),
                    email = encode_text(&user.email),
                    href = encode_double_quoted_attribute(&urlencoding::encode(&user.user_id)),
                    query = query_suffix(shell),
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => r#"<tr class="empty-row"><td colspan="3">No users found</td></tr>"#.to_string(),
    };

    let overlay = users
        .selected()
        .map(|detail| render_detail_overlay(detail, shell, formats))
        .unwrap_or_default();

    format!(
        r#"<section class="tab-view" aria-label="Users">
  <div class="card">
    <div class="view-header">
      <h2>Users List</h2>
      {refresh}
    </div>
    {roster_notice}
    {detail_notice}
    <table>
      <thead><tr><th>User ID</th><th>Email</th><th class="actions">Actions</th></tr></thead>
      <tbody>
{rows}
      </tbody>
    </table>
  </div>
  {overlay}
</section>"#,
        refresh = refresh_control(
            &format!("/dashboard/users/refresh{}", query_suffix(shell)),
            "Refresh users",
            roster.is_busy(),
            ack.then_some("Users refreshed!"),
        ),
        roster_notice = notice(roster.notice()),
        detail_notice = notice(users.detail.notice()),
    )
}

pub fn render_detail_overlay(detail: &UserDetail, shell: ShellState, formats: &Formats<'_>) -> String {
    let payments = detail
        .payments
        .iter()
        .map(|payment| {
            format!(
                r#"<tr class="payment-row"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                encode_text(&payment.payment_id),
                encode_text(&payment.order_id),
                encode_text(&formats.amount(payment.amount)),
                encode_text(&formats.date(&payment.created_at)),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<div class="overlay" role="dialog" aria-modal="true" aria-label="User Details">
  <div class="modal">
    <div class="modal-header">
      <h3>User Details</h3>
      <a class="icon-button" href="{close}" aria-label="Close">&#10005;</a>
    </div>
    <div class="profile">
      <div><span class="label">Name</span><span class="field" id="detail-name">{name}</span></div>
      <div><span class="label">Email</span><span class="field">{email}</span></div>
      <div><span class="label">Credits</span><span class="field">{credits}</span></div>
      <div><span class="label">Total Payments</span><span class="field">{total}</span></div>
    </div>
    <h4>Payment History</h4>
    <table>
      <thead><tr><th>Payment ID</th><th>Order ID</th><th>Amount</th><th>Date</th></tr></thead>
      <tbody>
{payments}
      </tbody>
    </table>
  </div>
</div>"#,
        close = shell.with_tab(Tab::Users).href(),
        name = encode_text(&detail.name),
        email = encode_text(&detail.email),
        credits = detail.credits,
        total = encode_text(&formats.amount(detail.total_payments)),
    )
}

pub fn render_bar_chart(points: &[MonthlyRevenue], formats: &Formats<'_>) -> String {
    const WIDTH: f64 = 600.0;
    const HEIGHT: f64 = 260.0;
    const PAD_X: f64 = 56.0;
    const PAD_Y: f64 = 34.0;
    const TOP: f64 = 20.0;
    const TICKS: usize = 4;

    if points.is_empty() {
        return format!(
            r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Monthly revenue"><text class="chart-empty" x="50%" y="50%" text-anchor="middle">No revenue data yet</text></svg>"#
        );
    }

    let max = points
        .iter()
        .map(|point| point.total_revenue)
        .fold(0.0_f64, f64::max);
    let max = if max > 0.0 { max } else { 1.0 };
    let plot_height = HEIGHT - TOP - PAD_Y;
    let slot = (WIDTH - PAD_X * 2.0) / points.len() as f64;
    let bar_width = slot * 0.6;
    let y = |value: f64| HEIGHT - PAD_Y - (value.max(0.0) / max) * plot_height;

    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="Monthly revenue">"#
    );
    for i in 0..=TICKS {
        let value = max * i as f64 / TICKS as f64;
        let y_pos = y(value);
        svg.push_str(&format!(
            r#"<line class="chart-grid" x1="{PAD_X}" y1="{y_pos:.2}" x2="{x2}" y2="{y_pos:.2}" /><text class="chart-label" x="{lx}" y="{ly:.2}" text-anchor="end">{label}</text>"#,
            x2 = WIDTH - PAD_X,
            lx = PAD_X - 8.0,
            ly = y_pos + 4.0,
            label = axis_label(value),
        ));
    }
    for (index, point) in points.iter().enumerate() {
        let x = PAD_X + slot * index as f64 + (slot - bar_width) / 2.0;
        let top = y(point.total_revenue);
        svg.push_str(&format!(
            r#"<rect class="bar" x="{x:.2}" y="{top:.2}" width="{bar_width:.2}" height="{h:.2}" rx="4"><title>{month}: {amount}</title></rect><text class="chart-label" x="{cx:.2}" y="{ly:.2}" text-anchor="middle">{month}</text>"#,
            h = HEIGHT - PAD_Y - top,
            month = encode_text(&point.month),
            amount = encode_text(&formats.amount(point.total_revenue)),
            cx = x + bar_width / 2.0,
            ly = HEIGHT - PAD_Y + 18.0,
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn axis_label(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

fn refresh_control(action: &str, label: &str, busy: bool, ack: Option<&str>) -> String {
    let (disabled, spin) = if busy { (" disabled", " spinning") } else { ("", "") };
    let toast = ack
        .map(|message| format!(r#"<div class="toast" data-ack>{}</div>"#, encode_text(message)))
        .unwrap_or_default();
    format!(
        r#"<form class="refresh" method="post" action="{action}" data-busy-form><button type="submit" class="icon-button primary{spin}" aria-label="{label}"{disabled}>&#8635;</button>{toast}</form>"#,
        action = encode_double_quoted_attribute(action),
    )
}

fn notice(message: Option<&str>) -> String {
    message
        .map(|message| format!(r#"<div class="notice" role="status">{}</div>"#, encode_text(message)))
        .unwrap_or_default()
}

fn query_suffix(shell: ShellState) -> &'static str {
    if shell.sidebar_open { "" } else { "?sidebar=closed" }
}

fn footer() -> String {
    format!(
        "&copy; {} {}. All rights reserved.",
        Local::now().year(),
        BRAND
    )
}

fn page_html(title: &str, head: &str, body_class: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", title)
        .replace("{{BRAND}}", BRAND)
        .replace("{{HEAD}}", head)
        .replace("{{BODY_CLASS}}", body_class)
        .replace("{{ACK_MS}}", &ACK_DURATION.as_millis().to_string())
        .replace("{{BODY}}", body)
}

const LOGIN_HTML: &str = r#"<div class="login-wrap">
  <div class="login-card">
    <h2>Welcome Back</h2>
    <p class="subtitle">Sign in to {{BRAND}} Admin Panel</p>
    {{BANNER}}
    <form method="post" action="/login" data-busy-form>
      <label for="email">Email</label>
      <input id="email" name="email" type="email" value="{{EMAIL}}" placeholder="Enter your email" required />
      <label for="password">Password</label>
      <input id="password" name="password" type="password" placeholder="Enter your password" required />
      <button type="submit" class="primary wide">Sign In</button>
    </form>
  </div>
</div>
<footer class="login-footer">{{FOOTER}}</footer>"#;

const SHELL_HTML: &str = r#"<div class="layout">
  <aside class="{{SIDEBAR_CLASS}}">
    <div class="sidebar-header">
      <h1>{{BRAND}}</h1>
      <a class="icon-button" href="{{CLOSE_SIDEBAR}}" aria-label="Close sidebar">&#8249;</a>
    </div>
    <nav>
      {{NAV_DASHBOARD}}
      {{NAV_USERS}}
    </nav>
  </aside>
  <div class="main">
    <header class="topbar">
      <div>{{OPEN_SIDEBAR}}</div>
      <div class="account">
        <span>Welcome, {{DISPLAY_NAME}}</span>
        <form method="post" action="/logout"><button type="submit" class="ghost">Logout</button></form>
      </div>
    </header>
    <main class="content">
{{CONTENT}}
    </main>
  </div>
</div>
<footer class="shell-footer">{{FOOTER}}</footer>"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  {{HEAD}}
  <title>{{TITLE}} | {{BRAND}}</title>
  <style>
    :root {
      --sky: #0ea5e9;
      --sky-dark: #0284c7;
      --ink: #1f2937;
      --muted: #6b7280;
      --card: #ffffff;
      --line: #e5e7eb;
      --shadow: 0 10px 30px rgba(15, 23, 42, 0.08);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      font-family: "Inter", "Segoe UI", sans-serif;
      color: var(--ink);
      display: flex;
      flex-direction: column;
    }

    .login-body { background: linear-gradient(135deg, #38bdf8, #0284c7); }
    .shell-body { background: #f9fafb; }

    .login-wrap { flex: 1; display: grid; place-items: center; padding: 24px; }
    .login-card { background: var(--card); border-radius: 16px; box-shadow: var(--shadow); width: min(420px, 100%); padding: 32px; }
    .login-card h2 { margin: 0 0 6px; text-align: center; font-size: 1.9rem; }
    .login-card .subtitle { margin: 0 0 24px; text-align: center; color: var(--muted); }
    .login-card form { display: grid; gap: 10px; }
    .login-card input { padding: 10px 12px; border: 1px solid #d1d5db; border-radius: 8px; font-size: 1rem; }
    .login-footer { padding: 16px; text-align: center; color: white; }

    .banner { padding: 12px 16px; border-radius: 8px; margin-bottom: 16px; text-align: center; }
    .banner.error { background: #fee2e2; border: 1px solid #f87171; color: #b91c1c; }
    .banner.success { background: #dcfce7; border: 1px solid #4ade80; color: #15803d; }

    button, .icon-button {
      appearance: none;
      border: none;
      border-radius: 8px;
      padding: 8px 12px;
      font-size: 1rem;
      cursor: pointer;
      text-decoration: none;
      color: inherit;
      background: transparent;
    }
    .primary { background: var(--sky); color: white; }
    .primary:hover { background: var(--sky-dark); }
    .wide { width: 100%; margin-top: 12px; }
    .ghost:hover, .icon-button:hover { background: #f3f4f6; }
    button[disabled] { opacity: 0.7; cursor: not-allowed; }
    .spinning { animation: spin 900ms linear infinite; }

    .layout { flex: 1; display: flex; }
    .sidebar { background: var(--card); box-shadow: var(--shadow); overflow: hidden; transition: width 300ms; }
    .sidebar.open { width: 256px; }
    .sidebar.closed { width: 0; }
    .sidebar-header { display: flex; justify-content: space-between; align-items: center; padding: 16px; }
    .sidebar-header h1 { margin: 0; font-size: 1.25rem; color: var(--sky-dark); white-space: nowrap; }
    .nav-item { display: block; padding: 12px 16px; color: var(--muted); text-decoration: none; }
    .nav-item.active { background: #f0f9ff; color: var(--sky-dark); }

    .main { flex: 1; min-width: 0; }
    .topbar { display: flex; justify-content: space-between; align-items: center; height: 64px; padding: 0 24px; background: var(--card); box-shadow: 0 1px 2px rgba(0, 0, 0, 0.05); }
    .account { display: flex; align-items: center; gap: 16px; }
    .account form { margin: 0; }
    .content { max-width: 1200px; margin: 0 auto; padding: 32px 24px; }

    .view-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 24px; }
    .view-header h2 { margin: 0; }
    .refresh { position: relative; margin: 0; }
    .toast { position: absolute; right: 0; top: 44px; background: #dcfce7; color: #166534; font-size: 0.75rem; padding: 4px 8px; border-radius: 6px; white-space: nowrap; }
    .notice { background: #fef3c7; color: #92400e; border: 1px solid #fcd34d; padding: 10px 14px; border-radius: 8px; margin-bottom: 16px; }

    .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 24px; margin-bottom: 32px; }
    .card { background: var(--card); border-radius: 14px; box-shadow: var(--shadow); padding: 24px; }
    .metric .label, .profile .label { display: block; color: var(--muted); font-size: 0.875rem; }
    .metric .value { display: block; font-size: 1.9rem; font-weight: 700; }

    .chart { width: 100%; height: 320px; }
    .chart-grid { stroke: var(--line); stroke-dasharray: 3 3; }
    .chart-label, .chart-empty { fill: var(--muted); font-size: 12px; }
    .bar { fill: var(--sky); }

    table { width: 100%; border-collapse: collapse; }
    th { background: #f9fafb; color: var(--muted); font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.05em; text-align: left; padding: 12px 24px; }
    td { padding: 16px 24px; border-top: 1px solid var(--line); font-size: 0.875rem; }
    .actions { text-align: right; }
    .link { color: var(--sky-dark); text-decoration: none; }
    .empty-row td { text-align: center; color: var(--muted); padding: 32px; }

    .loading { display: flex; gap: 12px; align-items: center; justify-content: center; height: 256px; color: var(--muted); }
    .spinner { width: 40px; height: 40px; border-radius: 50%; border: 3px solid var(--line); border-bottom-color: var(--sky-dark); animation: spin 900ms linear infinite; }

    .overlay { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.5); display: grid; place-items: center; padding: 16px; z-index: 50; }
    .modal { background: var(--card); border-radius: 14px; width: min(900px, 100%); max-height: 90vh; overflow: auto; padding: 24px; }
    .modal-header { display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid var(--line); padding-bottom: 16px; margin-bottom: 24px; }
    .modal-header h3 { margin: 0; }
    .profile { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 24px; margin-bottom: 24px; }
    .profile .field { display: block; font-size: 1.1rem; font-weight: 500; }

    .shell-footer { background: var(--card); padding: 16px; text-align: center; color: var(--muted); }

    @keyframes spin { to { transform: rotate(360deg); } }
  </style>
</head>
<body class="{{BODY_CLASS}}">
{{BODY}}
  <script>
    document.querySelectorAll('[data-busy-form]').forEach((form) => {
      form.addEventListener('submit', () => {
        const button = form.querySelector('button[type="submit"]');
        if (button) {
          button.disabled = true;
          button.classList.add('spinning');
        }
      });
    });
    document.querySelectorAll('[data-ack]').forEach((toast) => {
      setTimeout(() => toast.remove(), {{ACK_MS}});
    });
  </script>
</body>
</html>
"#;
