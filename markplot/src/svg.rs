// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SVG serialization of a node tree.
//!
//! Serialization is a pure walk: groups become `<g>` elements carrying their transform and
//! class, clipped groups reference a `<clipPath>` emitted in place.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};

use kurbo::{Affine, BezPath, PathEl, Rect};
use markplot_core::{Group, Node, Style, TextAnchor, TextBaseline};
use peniko::Brush;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Serializes `root` into a standalone SVG document of the given size.
pub(crate) fn to_svg(root: &Node, width: f64, height: f64, font_family: &str) -> String {
    let mut out = String::new();
    out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" "#);
    out.push_str(&format!(
        r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}">"#,
        escape_xml(font_family),
        w = num(width),
        h = num(height),
    ));
    out.push('\n');
    let mut clips = 0_usize;
    write_node(&mut out, root, &mut clips);
    out.push_str("</svg>\n");
    out
}

fn write_node(out: &mut String, node: &Node, clips: &mut usize) {
    match node {
        Node::Group(g) => write_group(out, g, clips),
        Node::Rect(r) => {
            out.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}""#,
                num(r.rect.x0.min(r.rect.x1)),
                num(r.rect.y0.min(r.rect.y1)),
                num(r.rect.width().abs()),
                num(r.rect.height().abs()),
            ));
            write_style(out, &r.style);
            close(out, "rect", r.title.as_deref());
        }
        Node::Path(p) => {
            out.push_str(&format!(r#"<path d="{}""#, path_data(&p.path)));
            write_style(out, &p.style);
            close(out, "path", p.title.as_deref());
        }
        Node::Text(t) => {
            out.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="{}""#,
                num(t.pos.x),
                num(t.pos.y),
                num(t.font_size)
            ));
            out.push_str(match t.anchor {
                TextAnchor::Start => "",
                TextAnchor::Middle => r#" text-anchor="middle""#,
                TextAnchor::End => r#" text-anchor="end""#,
            });
            out.push_str(match t.baseline {
                TextBaseline::Alphabetic => "",
                TextBaseline::Middle => r#" dominant-baseline="middle""#,
                TextBaseline::Hanging => r#" dominant-baseline="hanging""#,
            });
            if t.angle != 0.0 {
                out.push_str(&format!(
                    r#" transform="rotate({} {} {})""#,
                    num(t.angle),
                    num(t.pos.x),
                    num(t.pos.y)
                ));
            }
            write_paint_attr(out, "fill", Some(&t.fill));
            if t.opacity < 1.0 {
                out.push_str(&format!(r#" opacity="{}""#, num(t.opacity)));
            }
            out.push('>');
            out.push_str(&escape_xml(&t.text));
            out.push_str("</text>\n");
        }
    }
}

fn write_group(out: &mut String, g: &Group, clips: &mut usize) {
    let clip = g.clip.map(|rect| {
        *clips += 1;
        let id = format!("clip-{clips}");
        write_clip(out, &id, rect);
        id
    });
    out.push_str("<g");
    if let Some(class) = &g.class {
        out.push_str(&format!(r#" class="{}""#, escape_xml(class)));
    }
    if g.transform != Affine::IDENTITY {
        let [a, b, c, d, e, f] = g.transform.as_coeffs();
        if (a, b, c, d) == (1.0, 0.0, 0.0, 1.0) {
            out.push_str(&format!(r#" transform="translate({} {})""#, num(e), num(f)));
        } else {
            out.push_str(&format!(
                r#" transform="matrix({} {} {} {} {} {})""#,
                num(a),
                num(b),
                num(c),
                num(d),
                num(e),
                num(f)
            ));
        }
    }
    if let Some(id) = clip {
        out.push_str(&format!(r#" clip-path="url(#{id})""#));
    }
    out.push_str(">\n");
    for child in &g.children {
        write_node(out, child, clips);
    }
    out.push_str("</g>\n");
}

fn write_clip(out: &mut String, id: &str, rect: Rect) {
    out.push_str(&format!(
        r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
        num(rect.x0),
        num(rect.y0),
        num(rect.width()),
        num(rect.height()),
    ));
    out.push('\n');
}

fn write_style(out: &mut String, style: &Style) {
    write_paint_attr(out, "fill", style.fill.as_ref());
    if let Some(stroke) = &style.stroke {
        write_paint_attr(out, "stroke", Some(stroke));
        out.push_str(&format!(r#" stroke-width="{}""#, num(style.stroke_width)));
    }
    if style.opacity < 1.0 {
        out.push_str(&format!(r#" opacity="{}""#, num(style.opacity)));
    }
}

fn close(out: &mut String, tag: &str, title: Option<&str>) {
    match title {
        Some(title) => {
            out.push_str(&format!("><title>{}</title></{tag}>\n", escape_xml(title)));
        }
        None => out.push_str("/>\n"),
    }
}

fn svg_paint(brush: &Brush) -> (String, Option<f64>) {
    match brush {
        Brush::Solid(color) => {
            let rgba = color.to_rgba8();
            let paint = format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b);
            let opacity = if rgba.a == 255 {
                None
            } else {
                Some(f64::from(rgba.a) / 255.0)
            };
            (paint, opacity)
        }
        _ => ("none".to_string(), None),
    }
}

fn write_paint_attr(out: &mut String, name: &str, brush: Option<&Brush>) {
    let Some(brush) = brush else {
        out.push_str(&format!(r#" {name}="none""#));
        return;
    };
    let (value, opacity) = svg_paint(brush);
    out.push_str(&format!(r#" {name}="{value}""#));
    if let Some(o) = opacity {
        out.push_str(&format!(r#" {name}-opacity="{}""#, num(o)));
    }
}

fn path_data(path: &BezPath) -> String {
    let mut d = String::new();
    for el in path.elements() {
        if !d.is_empty() {
            d.push(' ');
        }
        match *el {
            PathEl::MoveTo(p) => d.push_str(&format!("M{},{}", num(p.x), num(p.y))),
            PathEl::LineTo(p) => d.push_str(&format!("L{},{}", num(p.x), num(p.y))),
            PathEl::QuadTo(p1, p) => d.push_str(&format!(
                "Q{},{} {},{}",
                num(p1.x),
                num(p1.y),
                num(p.x),
                num(p.y)
            )),
            PathEl::CurveTo(p1, p2, p) => d.push_str(&format!(
                "C{},{} {},{} {},{}",
                num(p1.x),
                num(p1.y),
                num(p2.x),
                num(p2.y),
                num(p.x),
                num(p.y)
            )),
            PathEl::ClosePath => d.push('Z'),
        }
    }
    d
}

/// Formats a coordinate with at most three decimals.
fn num(x: f64) -> String {
    let r = (x * 1000.0).round() / 1000.0;
    // Avoid printing `-0`.
    if r == 0.0 {
        "0".to_string()
    } else {
        format!("{r}")
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use kurbo::Point;
    use markplot_core::TextNode;
    use peniko::Color;

    use super::*;

    #[test]
    fn groups_rects_and_text_serialize() {
        let root = Node::translated(
            "cell",
            10.0,
            0.0,
            vec![
                Node::rect(Rect::new(0.0, 0.0, 5.0, 2.5), Style::filled(Color::BLACK)),
                Node::Text(TextNode::new(Point::new(1.0, 2.0), "a<b").with_anchor(TextAnchor::End)),
            ],
        );
        let svg = to_svg(&root, 100.0, 50.0, "sans-serif");
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50""#));
        assert!(svg.contains(r#"<g class="cell" transform="translate(10 0)">"#));
        assert!(svg.contains(r##"<rect x="0" y="0" width="5" height="2.5" fill="#000000"/>"##));
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(">a&lt;b</text>"));
    }

    #[test]
    fn clipped_groups_reference_a_clip_path() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0 / 3.0, 2.0));
        path.close_path();
        let root = Node::Group(Group {
            class: Some("clip".into()),
            clip: Some(Rect::new(0.0, 0.0, 4.0, 4.0)),
            children: vec![Node::path(path, Style::stroked(Color::BLACK, 1.0))],
            ..Group::default()
        });
        let svg = to_svg(&root, 4.0, 4.0, "serif");
        assert!(svg.contains(r#"<clipPath id="clip-1">"#));
        assert!(svg.contains(r#"clip-path="url(#clip-1)""#));
        assert!(svg.contains(r#"d="M0,0 L0.333,2 Z""#));
        assert!(svg.contains(r##"fill="none" stroke="#000000" stroke-width="1""##));
    }
}
