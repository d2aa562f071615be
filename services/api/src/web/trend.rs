//! services/api/src/web/trend.rs
//!
//! Renders the mood sentiment history as an SVG line chart.

use plotters::prelude::*;
use plotters::series::DashedLineSeries;

pub const NO_HISTORY_MESSAGE: &str = "No mood history available yet.";

const CHART_SIZE: (u32, u32) = (600, 300);
/// Dash and gap length of the zero line, in pixels.
const ZERO_LINE_DASH: i32 = 5;

#[derive(Debug, thiserror::Error)]
#[error("Failed to render trend chart: {0}")]
pub struct RenderError(String);

/// A rendered trend, or the placeholder shown when there is nothing to plot.
#[derive(Debug, Clone, PartialEq)]
pub enum TrendChart {
    Svg(String),
    Empty { message: &'static str },
}

/// Maps scores to `(position, score)` points, positions starting at 1.
pub fn trend_points(scores: &[f64]) -> Vec<(f64, f64)> {
    scores
        .iter()
        .enumerate()
        .map(|(i, score)| ((i + 1) as f64, *score))
        .collect()
}

/// Draws the scores in order with a zero reference line. No smoothing or binning.
pub fn render_trend(scores: &[f64]) -> Result<TrendChart, RenderError> {
    if scores.is_empty() {
        return Ok(TrendChart::Empty {
            message: NO_HISTORY_MESSAGE,
        });
    }

    let points = trend_points(scores);
    let x_max = scores.len() as f64 + 1.0;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Mood Sentiment Trend", ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(45)
            .build_cartesian_2d(0f64..x_max, -1f64..1f64)
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .x_desc("Entries")
            .y_desc("Sentiment Score")
            .draw()
            .map_err(render_error)?;

        let grey = RGBColor(128, 128, 128);
        chart
            .draw_series(DashedLineSeries::new(
                vec![(0.0, 0.0), (x_max, 0.0)],
                ZERO_LINE_DASH,
                ZERO_LINE_DASH,
                grey.stroke_width(1),
            ))
            .map_err(render_error)?;

        chart
            .draw_series(LineSeries::new(points.clone(), &BLUE))
            .map_err(render_error)?;
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 3, BLUE.filled())))
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
    }

    Ok(TrendChart::Svg(svg))
}

fn render_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_scores_means_placeholder() {
        assert_eq!(
            render_trend(&[]).unwrap(),
            TrendChart::Empty {
                message: "No mood history available yet."
            }
        );
    }

    #[test]
    fn points_are_one_based_and_unsmoothed() {
        assert_eq!(
            trend_points(&[0.0, -0.4767, 0.9]),
            vec![(1.0, 0.0), (2.0, -0.4767), (3.0, 0.9)]
        );
    }

    #[test]
    fn scores_render_to_svg() {
        match render_trend(&[0.0, -0.4767]).unwrap() {
            TrendChart::Svg(svg) => {
                assert!(svg.contains("<svg"));
                assert!(svg.contains("Mood Sentiment Trend"));
                assert!(svg.contains("<circle"));
            }
            other => panic!("expected an svg, got {:?}", other),
        }
    }

    #[test]
    fn zero_line_is_dashed() {
        let TrendChart::Svg(svg) = render_trend(&[0.5]).unwrap() else {
            panic!("expected an svg");
        };
        // Each dash is its own path segment.
        assert!(svg.matches("<polyline").count() > 10);
    }
}
