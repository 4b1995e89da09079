use chrono::NaiveDateTime;

use crate::chart::{ChartData, Selection};

const COLORS: &[&str] = &[
    "darkmagenta",
    "deeppink",
    "blue",
    "lime",
    "teal",
    "yellow",
    "turquoise",
    "lightcoral",
    "cyan",
    "black",
    "crimson",
    "green",
    "orangered",
    "red",
    "mediumvioletred",
    "lightsalmon",
];

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 800.0;
const MARGIN: f64 = 60.0;
const Y_TICKS: u64 = 5;

pub struct PageOptions<'a> {
    pub title: &'a str,
    pub y_label: &'a str,
    pub legend_form: bool,
}

/// Chart page: optional legend form plus an inline SVG of the selected series.
pub fn render_page(chart: &ChartData, selection: &Selection, opts: &PageOptions<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(opts.title)));
    html.push_str("<style>body{font-family:sans-serif;display:flex;gap:1em}label{display:block}</style>\n");
    html.push_str("</head>\n<body>\n");
    if opts.legend_form {
        html.push_str(&render_legend(chart, selection));
    }
    html.push_str(&render_svg(chart, selection, opts));
    html.push_str("</body>\n</html>\n");
    html
}

fn render_legend(chart: &ChartData, selection: &Selection) -> String {
    let mut out = String::from("<form method=\"get\">\n<input type=\"hidden\" name=\"picked\" value=\"1\">\n");
    for (idx, title) in chart.titles.iter().enumerate() {
        let checked = if selection.contains(idx) { " checked" } else { "" };
        out.push_str(&format!(
            "<label style=\"color:{}\"><input type=\"checkbox\" name=\"show\" value=\"{}\"{} onchange=\"this.form.submit()\"> {}</label>\n",
            color(idx),
            idx,
            checked,
            escape(title)
        ));
    }
    out.push_str("<noscript><button type=\"submit\">Update</button></noscript>\n</form>\n");
    out
}

fn render_svg(chart: &ChartData, selection: &Selection, opts: &PageOptions<'_>) -> String {
    let visible = selection.indices(chart.len());
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" style=\"background:#efefef\">\n"
    );
    out.push_str(&format!(
        "<text x=\"{MARGIN}\" y=\"30\" font-size=\"18\">{}</text>\n",
        escape(opts.title)
    ));

    let dated = visible
        .iter()
        .flat_map(|&idx| chart.series[idx].iter())
        .filter_map(|p| p.date.map(|d| (d, p.value)));
    let Some(bounds) = Bounds::from_points(dated) else {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\">No dated points to draw</text>\n</svg>\n",
            WIDTH / 2.0,
            HEIGHT / 2.0
        ));
        return out;
    };

    out.push_str(&render_axes(&bounds, opts.y_label));

    for &idx in &visible {
        let points: Vec<(NaiveDateTime, u64)> = chart.series[idx]
            .iter()
            .filter_map(|p| p.date.map(|d| (d, p.value)))
            .collect();
        if points.is_empty() {
            continue;
        }

        let coords: Vec<String> = points
            .iter()
            .map(|&(d, v)| format!("{:.1},{:.1}", bounds.x(d), bounds.y(v)))
            .collect();
        out.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"><title>{}</title></polyline>\n",
            color(idx),
            coords.join(" "),
            escape(&chart.titles[idx])
        ));
        for &(d, v) in &points {
            out.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"><title>date: {}\nreaders: {}</title></circle>\n",
                bounds.x(d),
                bounds.y(v),
                color(idx),
                d.format("%F-%T"),
                v
            ));
        }
    }

    out.push_str("</svg>\n");
    out
}

fn render_axes(bounds: &Bounds, y_label: &str) -> String {
    let bottom = HEIGHT - MARGIN;
    let right = WIDTH - MARGIN;
    let mut out = format!(
        "<line x1=\"{MARGIN}\" y1=\"{bottom}\" x2=\"{right}\" y2=\"{bottom}\" stroke=\"#444\"/>\n\
         <line x1=\"{MARGIN}\" y1=\"{MARGIN}\" x2=\"{MARGIN}\" y2=\"{bottom}\" stroke=\"#444\"/>\n"
    );

    for i in 0..=Y_TICKS {
        let value = (u128::from(bounds.v_max) * u128::from(i) / u128::from(Y_TICKS)) as u64;
        let y = bounds.y(value);
        out.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"end\">{}</text>\n",
            MARGIN - 6.0,
            y + 4.0,
            value
        ));
    }
    out.push_str(&format!(
        "<text x=\"16\" y=\"{:.1}\" font-size=\"12\" transform=\"rotate(-90 16 {:.1})\">{}</text>\n",
        HEIGHT / 2.0,
        HEIGHT / 2.0,
        escape(y_label)
    ));

    for (t, anchor) in [(bounds.t_min, "start"), (bounds.t_max, "end")] {
        if let Some(d) = chrono::DateTime::from_timestamp(t, 0) {
            out.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"{}\">{}</text>\n",
                bounds.x(d.naive_utc()),
                bottom + 18.0,
                anchor,
                d.format("%F")
            ));
        }
    }
    out
}

/// Data extent of the drawn points, in unix seconds and raw values.
struct Bounds {
    t_min: i64,
    t_max: i64,
    v_max: u64,
}

impl Bounds {
    fn from_points(points: impl Iterator<Item = (NaiveDateTime, u64)>) -> Option<Self> {
        points.fold(None, |acc: Option<Bounds>, (d, v)| {
            let t = d.and_utc().timestamp();
            Some(match acc {
                None => Bounds { t_min: t, t_max: t, v_max: v },
                Some(b) => Bounds {
                    t_min: b.t_min.min(t),
                    t_max: b.t_max.max(t),
                    v_max: b.v_max.max(v),
                },
            })
        })
    }

    fn x(&self, date: NaiveDateTime) -> f64 {
        let span = (self.t_max - self.t_min).max(1) as f64;
        let offset = (date.and_utc().timestamp() - self.t_min) as f64;
        MARGIN + offset / span * (WIDTH - 2.0 * MARGIN)
    }

    fn y(&self, value: u64) -> f64 {
        let top = self.v_max.max(1) as f64;
        HEIGHT - MARGIN - value as f64 / top * (HEIGHT - 2.0 * MARGIN)
    }
}

fn color(idx: usize) -> &'static str {
    COLORS[idx % COLORS.len()]
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
