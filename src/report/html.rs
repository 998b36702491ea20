//! HTML dashboard with D3.js visualizations
//!
//! One page serves both outputs. A static report embeds the dashboard and
//! shows it as-is; in live mode the sidebar selectors call back into the
//! local server and redraw a view with whatever it returns.

use super::Dashboard;
use std::io::{self, Write};

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Trendlens | Social Trends Dashboard</title>
    <script src="https://d3js.org/d3.v7.min.js"></script>
    <style>
        :root {
            --bg: #f8f9fa;
            --card: #ffffff;
            --border: #e0e0e0;
            --text: #333333;
            --dim: #666666;
            --primary: #034ea2;
            --accent: #1428a0;
            --soft: #f0f2f6;
            --shadow: 0 4px 6px rgba(0,0,0,0.05);
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
            display: grid;
            grid-template-columns: 300px 1fr;
            min-height: 100vh;
        }

        /* Sidebar */
        .sidebar {
            background: var(--card);
            border-right: 1px solid var(--border);
            padding: 1.5rem;
            overflow-y: auto;
            max-height: 100vh;
            position: sticky;
            top: 0;
        }
        .sidebar h1 { font-size: 1.3rem; color: var(--primary); margin-bottom: 1rem; }
        .nav button {
            display: block;
            width: 100%;
            text-align: left;
            background: none;
            border: 1px solid var(--border);
            border-radius: 8px;
            padding: 0.5rem 0.75rem;
            margin-bottom: 0.5rem;
            cursor: pointer;
            font-size: 0.9rem;
        }
        .nav button.active { background: var(--primary); color: white; border-color: var(--primary); }
        .stage { margin-top: 1.25rem; padding-top: 1rem; border-top: 1px solid var(--border); }
        .stage-title { font-size: 0.8rem; font-weight: 700; text-transform: uppercase; letter-spacing: 1px; color: var(--dim); margin-bottom: 0.5rem; }
        .stage-options { max-height: 220px; overflow-y: auto; font-size: 0.85rem; }
        .stage-options label { display: flex; gap: 0.4rem; align-items: center; padding: 2px 0; }
        .stage select { width: 100%; padding: 0.4rem; border-radius: 6px; border: 1px solid var(--border); }
        .surfaced { background: var(--soft); padding: 8px; border-radius: 5px; margin-top: 8px; font-size: 0.8rem; }
        .surfaced b { color: var(--primary); display: block; margin-bottom: 4px; }
        .static-note { font-size: 0.75rem; color: var(--dim); margin-top: 1rem; }

        /* Main panel */
        .main { padding: 2rem; max-width: 1400px; }
        .main h2 { font-size: 1.8rem; margin-bottom: 1.5rem; }
        .main h3 { font-size: 1.1rem; margin: 2rem 0 1rem; }
        .view { display: none; }
        .view.active { display: block; }
        .chart-card { background: var(--card); border-radius: 12px; box-shadow: var(--shadow); padding: 1rem; }
        .empty { color: var(--dim); padding: 2rem; text-align: center; }
        .api-error { display: none; background: #fdecea; color: #b71c1c; border-left: 4px solid #d62728; border-radius: 8px; padding: 0.75rem 1rem; margin-bottom: 1rem; }
        .api-error.visible { display: block; }

        /* KPI tiles */
        .kpis { display: grid; grid-template-columns: repeat(6, 1fr); gap: 1rem; }
        .kpi-box { background: white; padding: 20px; border-radius: 12px; border-top: 4px solid var(--primary); box-shadow: var(--shadow); text-align: center; }
        .kpi-value { font-size: 1.8rem; font-weight: bold; color: var(--primary); margin: 5px 0; }
        .kpi-label { font-size: 0.8rem; color: var(--dim); text-transform: uppercase; letter-spacing: 1px; }

        /* Banner + category cards */
        .banner { background: var(--primary); color: white; padding: 20px; border-radius: 12px; margin: 1.5rem 0; }
        .category-card { background: linear-gradient(135deg, #ffffff 0%, #f8f9fa 100%); border-left: 5px solid var(--primary); border-radius: 10px; padding: 12px 18px; margin-bottom: 12px; box-shadow: 0 2px 6px rgba(0,0,0,0.06); }
        .category-head { display: flex; justify-content: space-between; align-items: center; margin-bottom: 6px; }
        .category-head h4 { color: var(--primary); font-size: 1.1rem; }
        .pill { background: var(--primary); color: white; padding: 5px 14px; border-radius: 20px; font-size: 0.8rem; font-weight: 600; }
        .category-card p { color: #555; font-size: 0.9rem; }

        /* Influencer cards */
        .influencer-card { background: white; padding: 20px; border-radius: 15px; margin-bottom: 15px; border: 1px solid var(--border); transition: 0.3s ease; }
        .influencer-card:hover { box-shadow: 0 10px 20px rgba(0,0,0,0.1); transform: translateY(-3px); border-color: var(--primary); }
        .influencer-head { display: flex; justify-content: space-between; align-items: center; }
        .handle { font-size: 1.3rem; font-weight: bold; color: var(--primary); }
        .btn-link { text-decoration: none; color: white; background: var(--primary); padding: 8px 20px; border-radius: 20px; font-size: 0.8rem; font-weight: bold; }
        .metrics { display: flex; gap: 30px; margin-top: 15px; }
        .metrics small { color: var(--dim); }
        .card-desc { margin-top: 15px; color: #555; font-size: 0.9rem; border-top: 1px solid #f0f0f0; padding-top: 10px; }

        /* Tooltip */
        .tooltip { position: absolute; background: white; border: 1px solid var(--border); border-radius: 8px; padding: 0.75rem 1rem; font-size: 0.85rem; pointer-events: none; opacity: 0; transition: opacity 0.15s; z-index: 1000; box-shadow: 0 4px 12px rgba(0,0,0,0.15); max-width: 360px; }
        .tooltip.visible { opacity: 1; }
        .footer { margin-top: 3rem; color: var(--dim); font-size: 0.8rem; }
    </style>
</head>
<body>
    <aside class="sidebar">
        <h1>Trends Dashboard</h1>
        <div class="nav">
            <button data-view="trends" class="active">Macro &amp; Micro Trends</button>
            <button data-view="influencers">Microtrends &amp; Influencers</button>
        </div>
        <div id="trends-filters" class="filters"></div>
        <div id="influencers-filters" class="filters" style="display:none"></div>
        <div id="static-note" class="static-note"></div>
    </aside>

    <main class="main">
        <div id="api-error" class="api-error"></div>
        <section id="view-trends" class="view active">
            <h2>Trend Insights</h2>
            <h3>Distribution: macro-trends by engagement (views)</h3>
            <div id="treemap" class="chart-card"></div>
            <h3>Identified macro-trends</h3>
            <div id="macro-cards"></div>
            <div id="active-banner" class="banner"></div>
            <h3>Top micro-trends by views</h3>
            <div id="micro-bars" class="chart-card"></div>
        </section>

        <section id="view-influencers" class="view">
            <h2>Influencer Breakdown</h2>
            <div id="kpis" class="kpis"></div>
            <h3>Micro-trend frequency</h3>
            <div id="frequency" class="chart-card"></div>
            <h3>Social vs Media Power</h3>
            <div id="scatter" class="chart-card"></div>
            <h3>Top influencers by reach</h3>
            <div id="ranking"></div>
        </section>

        <div class="footer" id="footer"></div>
    </main>

    <div class="tooltip" id="tooltip"></div>

<script>
    let data = __DASHBOARD_DATA__;
    const LIVE = __LIVE__;
    const tooltip = d3.select('#tooltip');

    const esc = s => String(s ?? '').replace(/[&<>"']/g, c => ({
        '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
    }[c]));
    const fmtInt = d3.format(',.0f');

    function showTooltip(event, html) {
        tooltip.html(html)
            .style('left', (event.pageX + 12) + 'px')
            .style('top', (event.pageY - 12) + 'px')
            .classed('visible', true);
    }
    function hideTooltip() { tooltip.classed('visible', false); }

    function empty(el, text) {
        d3.select(el).html('').append('div').attr('class', 'empty').text(text || 'No data for this selection');
    }

    // Navigation
    document.querySelectorAll('.nav button').forEach(btn => {
        btn.addEventListener('click', () => {
            const view = btn.dataset.view;
            document.querySelectorAll('.nav button').forEach(b => b.classList.toggle('active', b === btn));
            document.querySelectorAll('.view').forEach(v => v.classList.toggle('active', v.id === 'view-' + view));
            document.getElementById('trends-filters').style.display = view === 'trends' ? '' : 'none';
            document.getElementById('influencers-filters').style.display = view === 'influencers' ? '' : 'none';
            if (view === 'influencers') drawInfluencers(); else drawTrends();
        });
    });

    // ---------------------------------------------------------------------
    // Filter sidebar
    // ---------------------------------------------------------------------

    const QUERY_KEYS = { channel: 'channel', macro_trend: 'macro', micro_trend: 'micro', handle: 'influencer' };
    const picks = { trends: {}, influencers: {} };

    function drawFilters(viewName, stages) {
        const root = d3.select('#' + viewName + '-filters').html('');
        stages.forEach((stage, idx) => {
            const box = root.append('div').attr('class', 'stage');
            box.append('div').attr('class', 'stage-title').text('Filter ' + stage.label);

            if (stage.kind === 'single_select') {
                // The leading option is "no pick"; its empty value never collides with a handle
                const select = box.append('select').property('disabled', !LIVE);
                select.selectAll('option').data(stage.options).join('option')
                    .attr('value', (d, i) => i === 0 ? '' : d).text(d => d)
                    .property('selected', (d, i) => i === 0 ? stage.selected.length === 0 : stage.selected.includes(d));
                select.on('change', function() {
                    picks[viewName][stage.category] = this.value === '' ? null : [this.value];
                    refresh(viewName, idx);
                });
            } else {
                const list = box.append('div').attr('class', 'stage-options');
                if (stage.options.length === 0) list.append('div').attr('class', 'empty').text('No options');
                const items = list.selectAll('label').data(stage.options).join('label');
                items.append('input').attr('type', 'checkbox')
                    .property('checked', d => stage.selected.includes(d))
                    .property('disabled', !LIVE)
                    .on('change', () => {
                        const checked = items.filter(function() { return this.firstChild.checked; }).data();
                        picks[viewName][stage.category] = checked.length === stage.options.length ? null : checked;
                        refresh(viewName, idx);
                    });
                items.append('span').text(d => d);
            }

            stage.surfaced.forEach(s => {
                const note = box.append('div').attr('class', 'surfaced');
                note.append('b').text(s.category);
                note.append('span').text(s.description);
            });
        });
    }

    async function refresh(viewName, changedIdx) {
        if (!LIVE) return;
        const stages = data[viewName].stages;
        // Upstream changes reset every downstream stage to its default
        stages.slice(changedIdx + 1).forEach(s => delete picks[viewName][s.category]);

        const params = new URLSearchParams();
        stages.forEach(s => {
            const pick = picks[viewName][s.category];
            if (pick == null) return;
            const key = QUERY_KEYS[s.category];
            if (pick.length === 0) params.append(key, '');
            pick.forEach(v => params.append(key, v));
        });

        const banner = d3.select('#api-error');
        let body;
        try {
            const res = await fetch('/api/' + viewName + '?' + params.toString());
            body = await res.json();
        } catch (err) {
            body = { ok: false, error: String(err) };
        }
        if (!body.ok) {
            banner.text('Could not refresh: ' + body.error).classed('visible', true);
            return;
        }
        banner.text('').classed('visible', false);
        data[viewName] = body.data;
        if (viewName === 'trends') drawTrends(); else drawInfluencers();
    }

    // ---------------------------------------------------------------------
    // Macro & Micro Trends
    // ---------------------------------------------------------------------

    function drawTrends() {
        const view = data.trends;
        drawFilters('trends', view.stages);
        drawTreemap(view.treemap);

        const cards = d3.select('#macro-cards').html('');
        if (view.macro_cards.length === 0) empty('#macro-cards');
        view.macro_cards.forEach(c => {
            const card = cards.append('div').attr('class', 'category-card');
            const head = card.append('div').attr('class', 'category-head');
            head.append('h4').text(c.category);
            head.append('span').attr('class', 'pill').text(c.views_display + ' views');
            card.append('p').text(c.description);
        });

        d3.select('#active-banner').html(
            `<b>Active analysis:</b> showing ${view.active.macro_trends} macro-trends and ` +
            `${view.active.micro_trends} micro-trends from your selection.`);

        drawBars('#micro-bars', view.micro_bars.map(b => ({
            label: b.category, value: b.value,
            tip: `<b>${esc(b.category)}</b><br>Engagement: ${fmtInt(b.value)} (${b.percent}%)<br><i>${esc(b.description)}</i>`
        })), d3.interpolateGnBu);
    }

    function drawTreemap(rows) {
        const el = document.getElementById('treemap');
        if (rows.length === 0 || d3.sum(rows, r => r.value) === 0) { empty(el); return; }
        const width = el.clientWidth || 1000, height = 600;
        const root = d3.hierarchy({ children: rows }).sum(d => d.value).sort((a, b) => b.value - a.value);
        d3.treemap().size([width, height]).paddingInner(2)(root);
        const color = d3.scaleSequential(d3.interpolateBlues).domain([0, d3.max(rows, r => r.value)]);

        const svg = d3.select(el).html('').append('svg').attr('width', width).attr('height', height);
        const node = svg.selectAll('g').data(root.leaves()).join('g')
            .attr('transform', d => `translate(${d.x0},${d.y0})`)
            .on('mousemove', (event, d) => showTooltip(event,
                `<b>${esc(d.data.category)}</b><br>${fmtInt(d.data.value)} views` +
                (d.data.description ? `<br><i>${esc(d.data.description)}</i>` : '')))
            .on('mouseout', hideTooltip);
        node.append('rect')
            .attr('width', d => d.x1 - d.x0).attr('height', d => d.y1 - d.y0)
            .attr('fill', d => color(d.data.value)).attr('stroke', 'white').attr('stroke-width', 2);
        const text = node.append('text')
            .attr('x', d => (d.x1 - d.x0) / 2).attr('text-anchor', 'middle')
            .attr('font-size', 13);
        text.selectAll('tspan').data(d => {
            const lines = d.data.label.split('\n');
            const mid = (d.y1 - d.y0) / 2 - (lines.length - 1) * 8;
            return lines.map((l, i) => ({ l, y: mid + i * 16 }));
        }).join('tspan').attr('x', function() { return this.parentNode.getAttribute('x'); })
            .attr('y', t => t.y).text(t => t.l);
    }

    function drawBars(selector, rows, interpolator) {
        const el = document.querySelector(selector);
        if (rows.length === 0) { empty(el); return; }
        const margin = { top: 10, right: 60, bottom: 30, left: 280 };
        const width = (el.clientWidth || 1000) - margin.left - margin.right;
        const height = Math.max(rows.length * 32, 120);

        // Rows arrive smallest first; draw the largest on top
        const y = d3.scaleBand().domain(rows.map((r, i) => i)).range([height, 0]).padding(0.2);
        const x = d3.scaleLinear().domain([0, d3.max(rows, r => r.value) || 1]).range([0, width]);
        const color = d3.scaleSequential(interpolator).domain([0, d3.max(rows, r => r.value) || 1]);

        const svg = d3.select(el).html('').append('svg')
            .attr('width', width + margin.left + margin.right)
            .attr('height', height + margin.top + margin.bottom)
            .append('g').attr('transform', `translate(${margin.left},${margin.top})`);

        svg.selectAll('rect').data(rows).join('rect')
            .attr('y', (r, i) => y(i)).attr('height', y.bandwidth())
            .attr('x', 0).attr('width', r => x(r.value)).attr('rx', 4)
            .attr('fill', r => color(r.value))
            .on('mousemove', (event, r) => showTooltip(event, r.tip))
            .on('mouseout', hideTooltip);
        svg.selectAll('text.value').data(rows).join('text').attr('class', 'value')
            .attr('x', r => x(r.value) + 6).attr('y', (r, i) => y(i) + y.bandwidth() / 2 + 4)
            .attr('font-size', 12).text(r => r.valueText ?? fmtInt(r.value));
        svg.append('g').call(d3.axisLeft(y).tickFormat(i => rows[i].label)).style('font-size', '12px');
        svg.append('g').attr('transform', `translate(0,${height})`).call(d3.axisBottom(x).ticks(6, '~s'));
    }

    // ---------------------------------------------------------------------
    // Microtrends & Influencers
    // ---------------------------------------------------------------------

    function drawInfluencers() {
        const view = data.influencers;
        drawFilters('influencers', view.stages);

        const kpis = d3.select('#kpis').html('');
        view.kpis.forEach(k => {
            const box = kpis.append('div').attr('class', 'kpi-box');
            box.append('div').attr('class', 'kpi-label').text(k.label);
            box.append('div').attr('class', 'kpi-value').text(k.display);
        });

        drawBars('#frequency', view.frequency.map(f => ({
            label: f.label, value: f.count, valueText: String(f.count),
            tip: `<b>${esc(f.category)}</b><br><br><i>${esc(f.description)}</i><br><br>` +
                 `Videos: <b>${f.count}</b> (${f.percent}%)<br>Engagement: <b>${fmtInt(f.engagement)}</b> views`
        })), d3.interpolatePurples);

        drawScatter(view.scatter);

        const list = d3.select('#ranking').html('');
        if (view.ranking.length === 0) empty('#ranking');
        view.ranking.forEach(r => {
            const card = list.append('div').attr('class', 'influencer-card');
            const head = card.append('div').attr('class', 'influencer-head');
            head.append('span').attr('class', 'handle').text(`${r.rank}. ${r.handle}`);
            if (r.link && /^https?:\/\//i.test(r.link)) head.append('a').attr('class', 'btn-link').attr('href', r.link).attr('target', '_blank').text('WATCH VIDEO');
            card.append('div').attr('class', 'metrics').html(
                `<div><small>VIEWS</small><br><b>${esc(r.views)}</b></div>` +
                `<div><small>FOLLOWERS</small><br><b>${esc(r.followers)}</b></div>` +
                `<div><small>AUDIENCE</small><br><b>${esc(r.audience)}</b></div>` +
                `<div><small>VIDEOS</small><br><b>${r.videos}</b></div>`);
            if (r.description) card.append('div').attr('class', 'card-desc').text(r.description);
        });
    }

    function drawScatter(plot) {
        const el = document.getElementById('scatter');
        if (plot.points.length === 0) { empty(el); return; }
        const margin = { top: 30, right: 50, bottom: 50, left: 70 };
        const width = (el.clientWidth || 1000) - margin.left - margin.right;
        const height = 600;
        const pad = plot.size_max / 2;

        const x = d3.scaleLinear().domain(d3.extent(plot.points, p => p.social_power)).nice().range([pad, width - pad]);
        const y = d3.scaleLinear().domain(d3.extent(plot.points, p => p.media_power)).nice().range([height - pad, pad]);
        const color = d3.scaleOrdinal(d3.schemeTableau10);

        const svg = d3.select(el).html('').append('svg')
            .attr('width', width + margin.left + margin.right)
            .attr('height', height + margin.top + margin.bottom)
            .append('g').attr('transform', `translate(${margin.left},${margin.top})`);

        svg.append('g').attr('transform', `translate(0,${height})`).call(d3.axisBottom(x));
        svg.append('g').call(d3.axisLeft(y));
        svg.append('text').attr('x', width / 2).attr('y', height + 40).attr('text-anchor', 'middle').text('Social Power');
        svg.append('text').attr('transform', 'rotate(-90)').attr('x', -height / 2).attr('y', -55).attr('text-anchor', 'middle').text('Media Power');

        // Biggest bubbles first so small ones stay hoverable
        const points = [...plot.points].sort((a, b) => b.size - a.size);
        svg.selectAll('circle').data(points).join('circle')
            .attr('cx', p => x(p.social_power)).attr('cy', p => y(p.media_power))
            .attr('r', p => Math.max(p.size / 2, 2))
            .attr('fill', p => color(p.color)).attr('fill-opacity', 0.7).attr('stroke', 'white')
            .on('mousemove', (event, p) => showTooltip(event,
                `<b>${esc(p.handle)}</b><br><br>Social Power: ${p.social_power.toFixed(4)}<br>` +
                `Media Power: ${fmtInt(p.media_power)}<br>Audience: ${fmtInt(p.audience)}<br>` +
                `Micro-trend: ${esc(p.color)}`))
            .on('mouseout', hideTooltip);
    }

    document.getElementById('footer').textContent =
        `Source: ${data.source} | ${data.dataset.rows} of ${data.dataset.source_rows} rows ` +
        `(${data.dataset.dropped} uncategorized dropped) | Generated ${data.generated}`;
    if (!LIVE) {
        document.getElementById('static-note').textContent =
            'Static report: selections were fixed when it was generated. Run "trendlens serve" to filter interactively.';
    }
    drawTrends();
</script>
</body>
</html>
"#;

/// Write a static report
pub fn write<W: Write>(writer: &mut W, dashboard: &Dashboard) -> io::Result<()> {
    writer.write_all(render(dashboard, false)?.as_bytes())
}

/// Full page with `dashboard` embedded; `live` enables the selectors
pub fn render(dashboard: &Dashboard, live: bool) -> io::Result<String> {
    let json = serde_json::to_string(dashboard)?;
    Ok(PAGE
        .replace("__DASHBOARD_DATA__", &script_safe(&json))
        .replace("__LIVE__", if live { "true" } else { "false" }))
}

/// Keep embedded JSON from closing the surrounding script element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::{Record, Table};
    use crate::filter::Selections;

    fn dashboard(macro_trend: &str) -> Dashboard {
        let table = Table {
            records: vec![Record {
                macro_trend: macro_trend.to_string(),
                engagement: 42.0,
                ..Record::default()
            }],
            source_rows: 1,
            ..Table::default()
        };
        Dashboard::build(&table, "base.xlsx", &Selections::default(), &DashboardConfig::default())
    }

    #[test]
    fn test_static_page_embeds_data() {
        let html = render(&dashboard("Beauty"), false).unwrap();
        assert!(html.contains("const LIVE = false;"));
        assert!(html.contains("\"category\":\"Beauty\""));
        assert!(!html.contains("__DASHBOARD_DATA__"));
    }

    #[test]
    fn test_live_page_flag() {
        let html = render(&dashboard("Beauty"), true).unwrap();
        assert!(html.contains("const LIVE = true;"));
    }

    #[test]
    fn test_script_breakout_escaped() {
        let html = render(&dashboard("</script><script>alert(1)</script>"), false).unwrap();
        assert!(!html.contains("</script><script>alert(1)"));
        assert!(html.contains("<\\/script>"));
    }

    #[test]
    fn test_page_has_every_chart_container() {
        let html = render(&dashboard("Beauty"), false).unwrap();
        for id in ["treemap", "macro-cards", "active-banner", "micro-bars", "kpis", "frequency", "scatter", "ranking"] {
            assert!(html.contains(&format!("id=\"{}\"", id)), "missing #{}", id);
        }
    }

    #[test]
    fn test_failed_refresh_uses_banner_not_chart_containers() {
        let html = render(&dashboard("Beauty"), true).unwrap();
        assert!(html.contains("id=\"api-error\""));
        assert!(!html.contains("empty('#view-'"));
    }

    #[test]
    fn test_write_matches_static_render() {
        let d = dashboard("Tech");
        let mut out = Vec::new();
        write(&mut out, &d).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), render(&d, false).unwrap());
    }
}
