use crate::application::history::{HistoryPanel, PanelStatus};
use crate::domain::reading::Site;
use crate::domain::summary::{ProductSummary, format_liters, format_temperature};
use crate::presentation::html_surface::escape;
use std::fmt::Write;

pub struct PageParts<'a> {
    pub status: String,
    pub cards: String,
    pub sites: &'a [Site],
    pub selected_site: Option<&'a str>,
    pub products: &'a [ProductSummary],
    pub history: Option<&'a HistoryPanel>,
    pub refresh_secs: u64,
}

pub fn render_page(parts: &PageParts<'_>) -> String {
    INDEX_HTML
        .replace("{{REFRESH_SECS}}", &parts.refresh_secs.to_string())
        .replace("{{SITE_OPTIONS}}", &render_site_options(parts.sites, parts.selected_site))
        .replace("{{STATUS}}", &parts.status)
        .replace("{{PRODUCTS}}", &render_products(parts.products))
        .replace("{{HISTORY}}", &parts.history.map(render_history).unwrap_or_default())
        .replace("{{CARDS}}", &parts.cards)
}

fn render_site_options(sites: &[Site], selected: Option<&str>) -> String {
    let mut html = format!(
        r#"<option value=""{}>All sites</option>"#,
        if selected.is_none() { " selected" } else { "" }
    );
    for site in sites {
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            escape(&site.id),
            if selected == Some(site.id.as_str()) { " selected" } else { "" },
            escape(&site.label())
        );
    }
    html
}

fn render_products(products: &[ProductSummary]) -> String {
    if products.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<ul class="products">"#);
    for product in products {
        let _ = write!(
            html,
            r#"<li><span class="swatch" style="background:{}"></span>{} · {} L · {}% · {} tanks</li>"#,
            escape(&product.color),
            escape(&product.product_name),
            format_liters(product.total_volume_15c_liters),
            product.share_percent,
            product.tank_count
        );
    }
    html.push_str("</ul>");
    html
}

fn render_history(panel: &HistoryPanel) -> String {
    let mut html = format!(
        r#"<aside class="history"><header><h2>History · {} / {}</h2><form method="post" action="/history/close"><button>Close</button></form></header>"#,
        escape(&panel.site_id),
        escape(&panel.tank_id)
    );

    match &panel.status {
        PanelStatus::Loading => html.push_str("<p>Loading…</p>"),
        PanelStatus::Failed(message) => {
            let _ = write!(html, r#"<p class="error">{}</p>"#, escape(message));
        }
        PanelStatus::Loaded if panel.readings.is_empty() => {
            html.push_str(r#"<p class="empty">No readings</p>"#)
        }
        PanelStatus::Loaded => {
            let liters = |v: Option<f64>| v.map(|l| format!("{} L", format_liters(l))).unwrap_or_else(|| "—".to_string());
            let _ = write!(
                html,
                r#"<p>Latest: {} · {} at 15 °C · {}</p>"#,
                liters(panel.latest.volume_liters),
                liters(panel.latest.volume_15c_liters),
                format_temperature(panel.latest.temperature_c)
            );
            if let Some(trend) = panel.trend_liters {
                let sign = if trend >= 0.0 { "+" } else { "" };
                let _ = write!(html, "<p>Trend: {}{} L</p>", sign, format_liters(trend));
            }
            html.push_str("<table><tr><th>Time</th><th>Volume</th><th>15 °C</th><th>Temp</th></tr>");
            for reading in &panel.readings {
                let when = match (&reading.timestamp, &reading.raw_timestamp) {
                    (Some(ts), _) => ts.format("%Y-%m-%d %H:%M").to_string(),
                    (None, Some(raw)) => raw.clone(),
                    (None, None) => "—".to_string(),
                };
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&when),
                    liters(reading.volume_liters),
                    liters(reading.volume_15c_liters),
                    format_temperature(reading.temperature_c)
                );
            }
            html.push_str("</table>");
        }
    }
    html.push_str("</aside>");
    html
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta http-equiv="refresh" content="{{REFRESH_SECS}}" />
  <title>Tank levels</title>
  <style>
    :root { --bg: #0f172a; --panel: #1e293b; --ink: #e2e8f0; --muted: #94a3b8; --bad: #ef4444; }
    * { box-sizing: border-box; }
    body { margin: 0; background: var(--bg); color: var(--ink); font-family: system-ui, sans-serif; }
    header.top { display: flex; gap: 16px; align-items: center; padding: 16px 24px; background: var(--panel); }
    header.top form { display: inline; }
    main { display: flex; gap: 24px; padding: 24px; }
    .cards { flex: 1; }
    .status { margin-bottom: 16px; }
    .status.error { color: var(--bad); }
    .muted { color: var(--muted); }
    .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 16px; }
    .card { display: flex; gap: 12px; background: var(--panel); border-radius: 12px; padding: 12px; }
    .tank { position: relative; width: 64px; height: 140px; border: 2px solid var(--muted); border-radius: 10px; overflow: hidden; }
    .liquid { position: absolute; bottom: 0; width: 100%; background: var(--fill); transition: height 600ms ease; }
    .pct { position: absolute; inset: 0; display: grid; place-items: center; font-weight: 600; }
    .tier::before { content: ""; display: inline-block; width: 8px; height: 8px; margin-right: 6px; border-radius: 50%; background: var(--dot); }
    dl { display: grid; grid-template-columns: auto 1fr; gap: 2px 8px; margin: 8px 0 0; }
    dd { margin: 0; font-weight: 600; }
    a { color: inherit; }
    .products { list-style: none; padding: 0; display: flex; gap: 16px; flex-wrap: wrap; }
    .swatch { display: inline-block; width: 10px; height: 10px; margin-right: 6px; border-radius: 2px; }
    .history { width: 360px; background: var(--panel); border-radius: 12px; padding: 12px; }
    .history table { width: 100%; border-collapse: collapse; font-size: 13px; }
    .history td, .history th { padding: 4px; text-align: right; }
    .empty { color: var(--muted); }
  </style>
</head>
<body>
  <header class="top">
    <strong>Tank levels</strong>
    <form method="post" action="/sites/select">
      <select name="site" onchange="this.form.submit()">{{SITE_OPTIONS}}</select>
    </form>
    <form method="post" action="/refresh"><button>Refresh</button></form>
  </header>
  <main>
    <div class="cards">
      {{STATUS}}
      {{PRODUCTS}}
      {{CARDS}}
    </div>
    {{HISTORY}}
  </main>
</body>
</html>
"#;
