// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plot demos for `markplot`.
//!
//! Each demo builds a [`PlotOptions`] and writes the rendered figure as an SVG file into the
//! directory given as the first argument (the current directory by default). Set `RUST_LOG=debug`
//! to follow scale inference and faceting.

use std::error::Error;
use std::path::{Path, PathBuf};

use markplot::{
    Curve, Dot, FacetOptions, Line, Mark, PlotOptions, ScaleOptions, SchemeName, Symbol, bar_y,
    dot, frame, line, rule_y, text,
};
use markplot_core::{ScaleName, ScaleType, Table, Value};
use markplot_transforms::{Map, MapOp, Stack, Transform, Window};

type DemoResult<T = ()> = Result<T, Box<dyn Error>>;

fn main() -> DemoResult {
    env_logger::init();
    let out_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("."), PathBuf::from);
    std::fs::create_dir_all(&out_dir)?;

    let demos: [(&str, fn() -> DemoResult<PlotOptions>); 5] = [
        ("scatter", scatter_demo),
        ("stacked_bars", stacked_bars_demo),
        ("faceted_lines", faceted_lines_demo),
        ("log_symbols", log_symbols_demo),
        ("labels", labels_demo),
    ];
    for (name, build) in demos {
        write_figure(&out_dir, name, &build()?)?;
    }
    Ok(())
}

fn write_figure(dir: &Path, name: &str, options: &PlotOptions) -> DemoResult {
    let figure = markplot::plot(options)?;
    let path = dir.join(format!("{name}.svg"));
    std::fs::write(&path, figure.to_svg())?;
    tracing::info!(path = %path.display(), width = figure.width, height = figure.height, "wrote figure");
    println!("wrote {}", path.display());
    Ok(())
}

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

/// A few penguin-like measurements.
fn penguins() -> DemoResult<Table> {
    Ok(Table::from_columns([
        (
            "species",
            texts(&[
                "Adelie", "Adelie", "Adelie", "Gentoo", "Gentoo", "Gentoo", "Chinstrap",
                "Chinstrap", "Chinstrap", "Adelie", "Gentoo", "Chinstrap",
            ]),
        ),
        (
            "bill",
            numbers(&[
                39.1, 38.6, 40.3, 46.1, 50.0, 48.7, 46.5, 50.0, 51.3, 36.7, 47.6, 45.4,
            ]),
        ),
        (
            "mass",
            numbers(&[
                3750.0, 3800.0, 3250.0, 4500.0, 5700.0, 5450.0, 3500.0, 3900.0, 3650.0, 3450.0,
                5400.0, 3525.0,
            ]),
        ),
        (
            "island",
            texts(&[
                "Torgersen", "Biscoe", "Dream", "Biscoe", "Biscoe", "Biscoe", "Dream", "Dream",
                "Dream", "Torgersen", "Biscoe", "Dream",
            ]),
        ),
    ])?)
}

fn scatter_demo() -> DemoResult<PlotOptions> {
    let data = penguins()?;
    Ok(PlotOptions::new()
        .with_grid(true)
        .with_x(ScaleOptions::new().with_label("Bill length (mm)").with_nice(true))
        .with_y(ScaleOptions::new().with_label("Body mass (g)").with_nice(true))
        .with_color(ScaleOptions::new().with_legend(true))
        .with_caption("Bill length against body mass")
        .with_mark(frame())
        .with_mark(dot(data).x("bill").y("mass").fill("species")))
}

fn stacked_bars_demo() -> DemoResult<PlotOptions> {
    let data = Table::from_columns([
        ("quarter", texts(&["Q1", "Q2", "Q3", "Q4", "Q1", "Q2", "Q3", "Q4"])),
        ("region", texts(&["north", "north", "north", "north", "south", "south", "south", "south"])),
        ("sales", numbers(&[12.0, 18.0, 9.0, 22.0, 7.0, 11.0, 15.0, 10.0])),
    ])?;
    let bars = bar_y(data)
        .x("quarter")
        .with_channel("y1", "y1")
        .with_channel("y2", "y2")
        .fill("region")
        .with_transform(Transform::Stack(Stack::new("sales", "quarter")));
    Ok(PlotOptions::new()
        .with_y(ScaleOptions::new().with_label("Sales").with_grid(true))
        .with_color(
            ScaleOptions::new()
                .with_scheme(SchemeName::Category10)
                .with_legend(true),
        )
        .with_mark(bars)
        .with_mark(rule_y(Table::empty(1)).y(vec![Value::from(0.0)])))
}

fn faceted_lines_demo() -> DemoResult<PlotOptions> {
    let mut date = Vec::new();
    let mut city = Vec::new();
    let mut temp = Vec::new();
    for (name, base) in [("Oslo", 2.0), ("Lisbon", 14.0)] {
        for day in 1..=28 {
            date.push(Value::ymd(2024, 2, day));
            city.push(Value::from(name));
            let wiggle = f64::from(day % 7) - 3.0;
            temp.push(Value::from(base + wiggle + f64::from(day) * 0.1));
        }
    }
    let data = Table::from_columns([("date", date), ("city", city), ("temp", temp)])?;
    let raw = Mark::new(Line::default().with_curve(Curve::StepAfter), data.clone())
        .x("date")
        .y("temp")
        .stroke("#bbbbbb");
    let smooth = line(data.clone())
        .x("date")
        .y("smooth")
        .stroke("steelblue")
        .with_transform(Transform::Window(Window::new("temp", "smooth", 7).with_z("city")));
    Ok(PlotOptions::new()
        .with_height(480.0)
        .with_facet(FacetOptions::new(data).with_y("city"))
        .with_y(ScaleOptions::new().with_label("Temperature (°C)"))
        .with_marks([frame(), raw, smooth]))
}

fn log_symbols_demo() -> DemoResult<PlotOptions> {
    let data = Table::from_columns([
        ("n", numbers(&[1.0, 3.0, 10.0, 30.0, 100.0, 300.0, 1000.0])),
        ("cost", numbers(&[2.0, 5.0, 9.0, 40.0, 95.0, 420.0, 1100.0])),
        ("kind", texts(&["a", "b", "a", "c", "b", "c", "a"])),
    ])?;
    let dots = Mark::new(Dot::default().with_r(5.0).with_symbol(Symbol::Square), data.clone())
        .x("n")
        .y("cost")
        .with_channel("symbol", "kind")
        .stroke("kind");
    let trend = line(data)
        .x("n")
        .y("cumulative")
        .stroke("gray")
        .with_transform(Transform::Map(Map::new("cost", "cumulative", MapOp::Cumsum)));
    Ok(PlotOptions::new()
        .with_x(
            ScaleOptions::new()
                .with_type(ScaleType::Log)
                .with_label("Items"),
        )
        .with_y(ScaleOptions::new().with_type(ScaleType::Log).with_grid(true))
        .with_scale(ScaleName::Symbol, ScaleOptions::new().with_legend(true))
        .with_marks([trend, dots]))
}

fn labels_demo() -> DemoResult<PlotOptions> {
    let data = Table::from_columns([
        ("letter", texts(&["E", "T", "A", "O", "I", "N"])),
        ("frequency", numbers(&[0.127, 0.091, 0.082, 0.075, 0.070, 0.067])),
    ])?;
    Ok(PlotOptions::new()
        .with_y(ScaleOptions::new().with_percent(true).with_label("Frequency (%)"))
        .with_mark(bar_y(data.clone()).x("letter").y("frequency").fill("steelblue"))
        .with_mark(
            text(data)
                .x("letter")
                .y("frequency")
                .with_channel("text", "letter"),
        ))
}
