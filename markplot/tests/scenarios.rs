// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end plotting scenarios.

use markplot::{
    FacetOptions, FormatCache, Locale, PlotOptions, ScaleOptions, TimeUnit, bar_y, dot, line, plot,
};
use markplot_core::{Node, ScaleName, Table, Value};
use markplot_transforms::{Transform, Window};

fn column(name: &str, values: impl IntoIterator<Item = f64>) -> Table {
    Table::from_columns([(name, values.into_iter().map(Value::from).collect())])
        .expect("one column")
}

#[test]
fn shared_x_domain_is_the_union_of_marks() {
    let a = column("x", [0.0, 4.0, 10.0]);
    let b = column("x", [5.0, 20.0]);
    let options = PlotOptions::new()
        .with_mark(dot(a).x("x"))
        .with_mark(dot(b).x("x"));
    let figure = plot(&options).expect("plot renders");
    let x = figure.scale(ScaleName::X).expect("x scale");
    assert_eq!(x.domain(), vec![Value::from(0.0), Value::from(20.0)]);
}

#[test]
fn a_name_without_a_column_is_a_constant() {
    let data = column("x", [1.0, 2.0]);
    let options = PlotOptions::new().with_mark(dot(data).x("x").fill("red"));
    let collected = collect_channels(&options);
    assert!(!collected.contains(&"fill"));
    let figure = plot(&options).expect("plot renders");
    assert!(figure.scale(ScaleName::Color).is_none());
    assert!(figure.to_svg().contains(r##"fill="#ff0000""##));
}

fn collect_channels(options: &PlotOptions) -> Vec<&'static str> {
    let collected = markplot::collect(options).expect("collects");
    collected
        .mark_channels(0)
        .expect("one mark")
        .iter()
        .map(|c| c.name)
        .collect()
}

#[test]
fn formatters_are_memoized_for_the_last_locale_only() {
    let en = Locale::new("en-US");
    let fr = Locale::new("fr-FR");

    let cache = FormatCache::new();
    cache.number_format(&en);
    cache.number_format(&fr);
    cache.number_format(&en);
    assert_eq!(cache.constructions(), 3);

    let cache = FormatCache::new();
    for _ in 0..3 {
        cache.number_format(&en);
    }
    assert_eq!(cache.constructions(), 1);

    // Date formatters are keyed by locale and unit.
    let cache = FormatCache::new();
    cache.time_format(&en, TimeUnit::Day);
    cache.time_format(&en, TimeUnit::Day);
    cache.time_format(&en, TimeUnit::Month);
    assert_eq!(cache.constructions(), 2);
}

#[test]
fn empty_facet_cells_keep_their_furniture() {
    let data = Table::from_columns([
        ("f", vec![Value::from("A"), Value::from("A")]),
        ("x", vec![Value::from(1.0), Value::from(2.0)]),
        ("y", vec![Value::from(3.0), Value::from(4.0)]),
    ])
    .expect("valid table");
    let options = PlotOptions::new()
        .with_facet(FacetOptions::new(data.clone()).with_x("f"))
        .with_fx(ScaleOptions::new().with_domain(["A", "B"]))
        .with_mark(dot(data).x("x").y("y"));
    let figure = plot(&options).expect("plot renders");

    let cells = figure.root.find_class("facet");
    assert_eq!(cells.len(), 2);
    let (a, b) = (cells[0], cells[1]);
    assert_eq!(a.find_class("dot").len(), 1);
    assert!(b.find_class("dot").is_empty());
    assert_eq!(b.find_class("axis-x").len(), 1);
    let fx = figure.scale(ScaleName::Fx).expect("fx scale");
    assert_eq!(fx.domain(), vec![Value::from("A"), Value::from("B")]);
}

#[test]
fn strict_window_mean_leaves_partial_windows_undefined() {
    let data = column("v", (0..6).map(f64::from));
    let window = Transform::Window(Window::new("v", "mean", 3).with_strict(true));
    let (out, _) = window
        .apply(&data, &[data.indices()])
        .expect("window applies");
    let mean = out.column("mean").expect("output column");
    assert_eq!(
        &mean[..],
        &[
            Value::Null,
            Value::from(1.0),
            Value::from(2.0),
            Value::from(3.0),
            Value::from(4.0),
            Value::Null,
        ]
    );
}

#[test]
fn faceted_bars_and_lines_serialize() {
    let data = Table::from_columns([
        (
            "k",
            ["a", "b", "c", "a", "b", "c"].into_iter().map(Value::from).collect(),
        ),
        (
            "v",
            [3.0, 5.0, 2.0, 4.0, 1.0, 6.0].into_iter().map(Value::from).collect(),
        ),
        (
            "g",
            ["p", "p", "p", "q", "q", "q"].into_iter().map(Value::from).collect(),
        ),
    ])
    .expect("valid table");
    let options = PlotOptions::new()
        .with_facet(FacetOptions::new(data.clone()).with_y("g"))
        .with_mark(bar_y(data.clone()).x("k").y("v").fill("k"))
        .with_mark(line(data).x("k").y("v"))
        .with_color(ScaleOptions::new().with_legend(true))
        .with_caption("Values by key");
    let figure = plot(&options).expect("plot renders");

    // Bars start at zero.
    let y = figure.scale(ScaleName::Y).expect("y scale");
    assert_eq!(y.domain()[0], Value::from(0.0));
    assert_eq!(figure.root.find_class("bar_y").len(), 2);
    assert_eq!(figure.root.find_class("legend").len(), 1);

    let svg = figure.to_svg();
    assert!(svg.contains("Values by key"));
    assert!(svg.trim_end().ends_with("</svg>"));
    let Node::Group(root) = &figure.root else {
        panic!("the root is a group");
    };
    assert!(!root.children.is_empty());
}
