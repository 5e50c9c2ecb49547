// Copyright 2025 the Markplot Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for domain inference, facet partitioning, transforms and pixel rounding.

use markplot::{
    Continuous, FacetOptions, Mapping, PlotOptions, Rounding, Scale, ScaleKind, TraceEvent, collect,
    dot, frame, plot, rule_x,
};
use markplot_core::{ScaleName, ScaleType, Table, Value};
use markplot_transforms::{CompareOp, Predicate, SortOrder, Transform, Window, apply_all};
use proptest::prelude::*;

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

fn keys(values: &[u8]) -> Vec<Value> {
    values
        .iter()
        .map(|k| Value::from(["a", "b", "c", "d"][usize::from(*k % 4)]))
        .collect()
}

fn table(x: &[f64], k: &[u8]) -> Table {
    let n = x.len().min(k.len());
    Table::from_columns([("x", numbers(&x[..n])), ("k", keys(&k[..n]))]).expect("equal lengths")
}

fn extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Inverts every pixel of `0..=width`, rounds it and checks the results strictly increase.
fn assert_strictly_increasing(
    rounding: &Rounding,
    c: &Continuous,
    width: f64,
) -> Result<(), TestCaseError> {
    let mut prev = f64::NEG_INFINITY;
    #[allow(clippy::cast_possible_truncation, reason = "small pixel widths")]
    for p in 0..=(width as u32) {
        let v = rounding.apply(c.invert(f64::from(p)));
        prop_assert!(v > prev, "pixel {p}: {v} after {prev}");
        prev = v;
    }
    Ok(())
}

proptest! {
    #[test]
    fn shared_domain_covers_every_channel(
        a in prop::collection::vec(-1e6_f64..1e6, 1..20),
        b in prop::collection::vec(-1e6_f64..1e6, 1..20),
    ) {
        let ta = Table::from_columns([("v", numbers(&a))]).expect("one column");
        let tb = Table::from_columns([("v", numbers(&b))]).expect("one column");
        let options = PlotOptions::new()
            .with_mark(dot(ta).x("v"))
            .with_mark(rule_x(tb).x("v"));
        let collected = collect(&options).expect("collects");
        let spec = collected.scale_spec(ScaleName::X).expect("x is inferred");
        let domain = spec.domain_values();
        let lo = domain[0].as_f64().expect("numeric");
        let hi = domain[domain.len() - 1].as_f64().expect("numeric");
        for (min, max) in [extent(&a), extent(&b)] {
            prop_assert!(lo <= min && max <= hi, "{lo}..{hi} misses {min}..{max}");
        }
    }

    #[test]
    fn transforms_keep_indices_aligned(
        x in prop::collection::vec(-100.0_f64..100.0, 0..40),
        k in prop::collection::vec(any::<u8>(), 0..40),
        window in 1_usize..6,
    ) {
        let data = table(&x, &k);
        let transforms = [
            Transform::Filter(Predicate::compare("x", CompareOp::Gt, 0.0)),
            Transform::Sort { by: "x".into(), order: SortOrder::Desc },
            Transform::Window(Window::new("x", "mean", window).with_z("k")),
            Transform::Reverse,
        ];
        let facets = vec![data.indices(), Vec::new()];
        let (out, out_facets) = apply_all(&transforms, &data, &facets).expect("transforms apply");
        prop_assert_eq!(out_facets.len(), facets.len());
        for facet in &out_facets {
            prop_assert!(facet.iter().all(|&i| i < out.len()));
        }
        for column in out.columns() {
            prop_assert_eq!(column.values.len(), out.len());
        }
    }

    #[test]
    fn every_row_lands_in_exactly_one_cell(
        x in prop::collection::vec(-100.0_f64..100.0, 1..40),
        k in prop::collection::vec(any::<u8>(), 1..40),
    ) {
        let data = table(&x, &k);
        let options = PlotOptions::new()
            .with_facet(FacetOptions::new(data.clone()).with_x("k"))
            .with_mark(dot(data.clone()).x("x"));
        let collected = collect(&options).expect("collects");
        let mut rows: Vec<usize> = collected
            .mark_facets(0)
            .expect("one mark")
            .iter()
            .flatten()
            .copied()
            .collect();
        rows.sort_unstable();
        prop_assert_eq!(rows, data.indices());
    }

    #[test]
    fn pixel_rounding_keeps_adjacent_pixels_apart(
        lo in -1e6_f64..1e6,
        span in 1e-3_f64..1e6,
        width in 50_u32..800,
    ) {
        let width = f64::from(width);
        let c = Continuous::new(Mapping::Linear, vec![lo, lo + span], vec![0.0, width]);
        let scale = Scale::new(ScaleName::X, ScaleType::Linear, ScaleKind::Continuous(c.clone()));
        assert_strictly_increasing(&scale.pixel_rounding(), &c, width)?;
    }

    #[test]
    fn temporal_pixel_rounding_keeps_adjacent_pixels_apart(
        lo in 0.0_f64..2e12,
        span in 1e3_f64..3e12,
        width in 50_u32..800,
    ) {
        let width = f64::from(width);
        let c = Continuous::new(Mapping::Linear, vec![lo, lo + span], vec![0.0, width])
            .with_temporal(true);
        let scale = Scale::new(ScaleName::X, ScaleType::Utc, ScaleKind::Continuous(c.clone()));
        assert_strictly_increasing(&scale.pixel_rounding(), &c, width)?;
    }

    #[test]
    fn log_pixel_rounding_keeps_adjacent_pixels_apart(
        lo in 1e-2_f64..1e4,
        ratio in 1.5_f64..1e4,
        width in 50_u32..800,
    ) {
        let width = f64::from(width);
        let mapping = Mapping::Log { base: 10.0, negative: false };
        let c = Continuous::new(mapping, vec![lo, lo * ratio], vec![0.0, width]);
        let scale = Scale::new(ScaleName::X, ScaleType::Log, ScaleKind::Continuous(c.clone()));
        assert_strictly_increasing(&scale.pixel_rounding(), &c, width)?;
    }

    #[test]
    fn scales_finalize_before_marks_render(
        x in prop::collection::vec(-100.0_f64..100.0, 1..20),
        k in prop::collection::vec(any::<u8>(), 1..20),
        marks in 1_usize..4,
    ) {
        let data = table(&x, &k);
        let mut options = PlotOptions::new()
            .with_facet(FacetOptions::new(data.clone()).with_y("k"))
            .with_mark(frame());
        for _ in 0..marks {
            options = options.with_mark(dot(data.clone()).x("x").fill("k"));
        }
        let figure = plot(&options).expect("plot renders");
        let trace = figure.trace();
        let last_scale = trace
            .iter()
            .rposition(|e| matches!(e, TraceEvent::ScaleFinalized(_)))
            .expect("scales are traced");
        let first_mark = trace
            .iter()
            .position(|e| matches!(e, TraceEvent::MarkRendered { .. }))
            .expect("marks are traced");
        prop_assert!(last_scale < first_mark);
        let cells = figure.scale(ScaleName::Fy).expect("fy scale").domain().len();
        prop_assert_eq!(trace.len() - first_mark, (marks + 1) * cells);
    }
}
