//! Static HTML dashboard.
//!
//! Renders the league to self-contained pages: a ladder index, a match
//! log, and one profile page per player. Profile pages embed the rating
//! samples as a JSON data element and construct the uncertainty-band
//! chart from the configuration built by the page module, so the browser
//! draws exactly what the tests exercise.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::logging::log_dashboard_written;
use crate::model::{MatchSummary, Player, PlayerStats, RatingSample, WinLossRow};
use crate::page::{rating_chart_spec, ChartSeries};
use crate::processor::MatchProcessor;

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js";

const CSS: &str = r#"
body { font-family: system-ui, -apple-system, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; color: #333; }
.container { max-width: 960px; margin: 0 auto; }
h1 { margin-bottom: 4px; }
.subtitle { color: #666; margin-bottom: 24px; }
nav a { margin-right: 16px; color: #3498db; text-decoration: none; }
table { width: 100%; border-collapse: collapse; background: white; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); margin-bottom: 24px; }
th, td { padding: 10px 14px; text-align: left; border-bottom: 1px solid #eee; }
th { color: #666; font-size: 0.85em; text-transform: uppercase; }
tr.clickable-row { cursor: pointer; }
tr.clickable-row:hover { background: #eef6fc; }
.stat-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(140px, 1fr)); gap: 16px; margin-bottom: 24px; }
.stat-card { background: white; padding: 16px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); text-align: center; }
.stat-label { color: #666; font-size: 0.85em; margin-bottom: 6px; }
.stat-value { font-size: 1.6em; font-weight: bold; }
.chart-container { background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); margin-bottom: 24px; }
.form span { display: inline-block; width: 22px; text-align: center; border-radius: 4px; margin-right: 4px; color: white; font-weight: bold; }
.form .win { background: #059669; }
.form .loss { background: #dc2626; }
"#;

const ROW_NAV_JS: &str = r#"
document.addEventListener("DOMContentLoaded", () => {
    const rows = document.querySelectorAll(".clickable-row");
    rows.forEach(row => {
        row.addEventListener("click", () => {
            const href = row.getAttribute("data-href");
            if (href) {
                window.location.href = href;
            }
        });
    });
});
"#;

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page_shell(title: &str, body: &str, extra_head: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
{extra_head}</head>
<body>
    <div class="container">
        <nav><a href="index.html">Ladder</a><a href="matches.html">Matches</a></nav>
{body}
    </div>
    <script>{row_nav}</script>
</body>
</html>
"#,
        title = html_escape(title),
        css = CSS,
        extra_head = extra_head,
        body = body,
        row_nav = ROW_NAV_JS,
    )
}

pub fn render_index(ladder: &[Player], wlt: &[WinLossRow], recent: &[MatchSummary]) -> String {
    let mut body = String::new();
    body.push_str("<h1>Rankings</h1>\n<p class=\"subtitle\">Ordered by conservative rating (μ − 3σ)</p>\n");

    body.push_str("<table>\n<tr><th>#</th><th>Player</th><th>Rating (μ)</th><th>±σ</th><th>Conservative</th></tr>\n");
    for (idx, p) in ladder.iter().enumerate() {
        body.push_str(&format!(
            "<tr class=\"clickable-row\" data-href=\"player-{id}.html\"><td>{rank}</td><td>{name}</td><td>{mu:.1}</td><td>{sigma:.1}</td><td>{cons:.1}</td></tr>\n",
            id = p.id,
            rank = idx + 1,
            name = html_escape(&p.name),
            mu = p.mu,
            sigma = p.sigma,
            cons = p.conservative(),
        ));
    }
    body.push_str("</table>\n");

    body.push_str("<h2>Win/Loss</h2>\n<table>\n<tr><th>Player</th><th>MP</th><th>W</th><th>L</th><th>Win%</th></tr>\n");
    for row in wlt {
        body.push_str(&format!(
            "<tr class=\"clickable-row\" data-href=\"player-{id}.html\"><td>{name}</td><td>{mp}</td><td>{w}</td><td>{l}</td><td>{pct:.1}</td></tr>\n",
            id = row.id,
            name = html_escape(&row.name),
            mp = row.played,
            w = row.wins,
            l = row.losses,
            pct = row.win_pct,
        ));
    }
    body.push_str("</table>\n");

    body.push_str("<h2>Recent Matches</h2>\n");
    body.push_str(&matches_table(recent));

    page_shell("Rankings", &body, "")
}

fn matches_table(matches: &[MatchSummary]) -> String {
    let mut out = String::from(
        "<table>\n<tr><th>Date</th><th>Player 1</th><th>Score</th><th>Player 2</th></tr>\n",
    );
    for m in matches {
        out.push_str(&format!(
            "<tr><td>{ts}</td><td>{p1}</td><td>{s1}–{s2}</td><td>{p2}</td></tr>\n",
            ts = html_escape(&m.timestamp),
            p1 = html_escape(&m.player1),
            s1 = m.score1,
            s2 = m.score2,
            p2 = html_escape(&m.player2),
        ));
    }
    out.push_str("</table>\n");
    out
}

pub fn render_matches(matches: &[MatchSummary]) -> String {
    let mut body = String::from("<h1>Match Log</h1>\n");
    if matches.is_empty() {
        body.push_str("<p class=\"subtitle\">No matches recorded yet</p>\n");
    } else {
        body.push_str(&matches_table(matches));
    }
    page_shell("Match Log", &body, "")
}

pub fn render_player(stats: &PlayerStats, history: &[RatingSample], form: &[bool]) -> Result<String> {
    let p = &stats.player;
    let mut body = format!(
        "<h1>{name}</h1>\n<p class=\"subtitle\">Last updated {updated}</p>\n",
        name = html_escape(&p.name),
        updated = html_escape(&p.last_updated),
    );

    let win_pct = if stats.total_matches > 0 {
        stats.wins as f64 / stats.total_matches as f64 * 100.0
    } else {
        0.0
    };
    body.push_str(&format!(
        concat!(
            "<div class=\"stat-grid\">\n",
            "<div class=\"stat-card\"><div class=\"stat-label\">Rating</div><div class=\"stat-value\">{mu:.1} ±{sigma:.1}</div></div>\n",
            "<div class=\"stat-card\"><div class=\"stat-label\">Peak Rating</div><div class=\"stat-value\">{peak:.1}</div></div>\n",
            "<div class=\"stat-card\"><div class=\"stat-label\">Record</div><div class=\"stat-value\">{wins}–{losses}</div></div>\n",
            "<div class=\"stat-card\"><div class=\"stat-label\">Win %</div><div class=\"stat-value\">{pct:.1}</div></div>\n",
            "</div>\n",
        ),
        mu = p.mu,
        sigma = p.sigma,
        peak = stats.peak_rating,
        wins = stats.wins,
        losses = stats.losses,
        pct = win_pct,
    ));

    body.push_str(&format!(
        concat!(
            "<div class=\"stat-grid\">\n",
            "<div class=\"stat-card\"><div class=\"stat-label\">Victim</div><div class=\"stat-value\">{victim}</div><div class=\"stat-label\">{vr:.0}% win rate</div></div>\n",
            "<div class=\"stat-card\"><div class=\"stat-label\">Nemesis</div><div class=\"stat-value\">{nemesis}</div><div class=\"stat-label\">{nr:.0}% win rate</div></div>\n",
            "</div>\n",
        ),
        victim = html_escape(&stats.victim.name),
        vr = stats.victim.rate * 100.0,
        nemesis = html_escape(&stats.nemesis.name),
        nr = stats.nemesis.rate * 100.0,
    ));

    if !form.is_empty() {
        body.push_str("<p class=\"form\">Form: ");
        for won in form {
            if *won {
                body.push_str("<span class=\"win\">W</span>");
            } else {
                body.push_str("<span class=\"loss\">L</span>");
            }
        }
        body.push_str("</p>\n");
    }

    let samples_json = serde_json::to_string(history)?;
    let spec = rating_chart_spec(&ChartSeries::derive(history));
    let spec_json = serde_json::to_string(&spec)?;
    body.push_str(&format!(
        concat!(
            "<div class=\"chart-container\">\n",
            "<h2>Rating History</h2>\n",
            "<script id=\"ratingData\" type=\"application/json\">{samples}</script>\n",
            "<canvas id=\"ratingChart\"></canvas>\n",
            "</div>\n",
            "<script>\n",
            "document.addEventListener(\"DOMContentLoaded\", () => {{\n",
            "    const ctx = document.getElementById(\"ratingChart\");\n",
            "    if (!ctx) return;\n",
            "    new Chart(ctx, {spec});\n",
            "}});\n",
            "</script>\n",
        ),
        samples = samples_json,
        spec = spec_json,
    ));

    let head = format!("    <script src=\"{}\"></script>\n", CHART_JS_CDN);
    Ok(page_shell(&p.name, &body, &head))
}

/// Write the full site. Returns the number of pages written.
pub fn write_dashboard(proc: &MatchProcessor, out_dir: &Path, recent_limit: usize) -> Result<usize> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let ladder = proc.ladder()?;
    let wlt = proc.win_loss_table()?;
    let recent = proc.recent_matches(recent_limit)?;

    let mut pages = 0;
    fs::write(out_dir.join("index.html"), render_index(&ladder, &wlt, &recent))?;
    pages += 1;
    fs::write(out_dir.join("matches.html"), render_matches(&recent))?;
    pages += 1;

    for p in &ladder {
        let stats = proc.player_stats(p.id)?;
        let history = proc.rating_history(p.id)?;
        let form = proc.recent_form(p.id, 5)?;
        let html = render_player(&stats, &history, &form)?;
        fs::write(out_dir.join(format!("player-{}.html", p.id)), html)?;
        pages += 1;
    }

    log_dashboard_written(&out_dir.to_string_lossy(), pages);
    Ok(pages)
}
