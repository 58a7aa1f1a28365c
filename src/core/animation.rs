use std::collections::BTreeMap;

use serde::Serialize;

use super::types::LongSeriesRow;

const TITLE: &str = "Net Worth Over 25 Years";
const SLIDER_FRAME_MS: u32 = 500;
const PLAY_FRAME_MS: u32 = 300;

/// Declarative bar-chart-race description handed to the chart renderer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color_label: String,
    pub frames: Vec<AnimationFrame>,
    pub slider: Slider,
    pub controls: Vec<PlaybackControl>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationFrame {
    /// Month number as text; slider steps target frames by this name.
    pub name: String,
    pub month: u32,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub name: String,
    pub profession: String,
    pub net_worth: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slider {
    pub prefix: String,
    pub steps: Vec<SliderStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderStep {
    pub label: String,
    pub frame: String,
    pub frame_duration_ms: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackControl {
    pub label: String,
    pub frame_duration_ms: u32,
    pub redraw: bool,
    pub from_current: bool,
}

pub fn build_animation(rows: &[LongSeriesRow]) -> AnimationSpec {
    let mut by_month: BTreeMap<u32, Vec<Bar>> = BTreeMap::new();
    for row in rows {
        by_month.entry(row.month).or_default().push(Bar {
            name: row.name.clone(),
            profession: row.profession.clone(),
            net_worth: row.net_worth,
            label: row.label.clone(),
        });
    }

    let last_month = by_month.keys().next_back().copied().unwrap_or(0);
    let frames = by_month
        .into_iter()
        .map(|(month, bars)| AnimationFrame {
            name: month.to_string(),
            month,
            bars,
        })
        .collect();

    AnimationSpec {
        title: TITLE.to_string(),
        x_label: "Net Worth ($)".to_string(),
        y_label: "Participants".to_string(),
        color_label: "Career".to_string(),
        frames,
        slider: Slider {
            prefix: "Jump to: ".to_string(),
            steps: yearly_steps(last_month),
        },
        controls: vec![
            PlaybackControl {
                label: "Play".to_string(),
                frame_duration_ms: PLAY_FRAME_MS,
                redraw: true,
                from_current: true,
            },
            PlaybackControl {
                label: "Pause".to_string(),
                frame_duration_ms: 0,
                redraw: false,
                from_current: false,
            },
        ],
    }
}

/// One jump point per completed year, at month `year * 12`.
fn yearly_steps(last_month: u32) -> Vec<SliderStep> {
    (1..=last_month / 12)
        .map(|year| SliderStep {
            label: format!("Year {year}"),
            frame: (year * 12).to_string(),
            frame_duration_ms: SLIDER_FRAME_MS,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cohort::build_series;
    use crate::core::engine::ProjectionConfig;
    use crate::core::types::{
        CareerCatalog, HORIZON_MONTHS, MilitaryService, ParticipantRecord,
    };

    fn sample_rows() -> Vec<LongSeriesRow> {
        let participants = ["Ava", "Ben", "Cal"]
            .iter()
            .map(|name| ParticipantRecord {
                name: name.to_string(),
                career: "Unlisted".to_string(),
                military_service: MilitaryService::No,
                savings: 100.0,
            })
            .collect::<Vec<_>>();
        build_series(
            &participants,
            &CareerCatalog::default(),
            &ProjectionConfig::default(),
        )
        .rows
    }

    #[test]
    fn one_frame_per_month_with_every_participant() {
        let spec = build_animation(&sample_rows());
        assert_eq!(spec.frames.len(), HORIZON_MONTHS as usize);
        for (idx, frame) in spec.frames.iter().enumerate() {
            assert_eq!(frame.month, idx as u32 + 1);
            assert_eq!(frame.name, frame.month.to_string());
            let names = frame.bars.iter().map(|b| b.name.as_str()).collect::<Vec<_>>();
            assert_eq!(names, vec!["Ava", "Ben", "Cal"]);
        }
    }

    #[test]
    fn slider_has_yearly_steps_that_target_existing_frames() {
        let spec = build_animation(&sample_rows());
        assert_eq!(spec.slider.steps.len(), 25);
        assert_eq!(spec.slider.steps[0].label, "Year 1");
        assert_eq!(spec.slider.steps[0].frame, "12");
        assert_eq!(spec.slider.steps[24].frame, "300");
        for step in &spec.slider.steps {
            assert!(spec.frames.iter().any(|f| f.name == step.frame));
        }
    }

    #[test]
    fn play_and_pause_controls_are_present() {
        let spec = build_animation(&sample_rows());
        let labels = spec.controls.iter().map(|c| c.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Play", "Pause"]);
        assert_eq!(spec.controls[1].frame_duration_ms, 0);
    }

    #[test]
    fn empty_series_has_no_frames_or_steps() {
        let spec = build_animation(&[]);
        assert!(spec.frames.is_empty());
        assert!(spec.slider.steps.is_empty());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_string(&build_animation(&sample_rows())).expect("serializes");
        assert!(json.contains("\"frames\""));
        assert!(json.contains("\"netWorth\""));
        assert!(json.contains("\"frameDurationMs\""));
        assert!(json.contains("\"fromCurrent\""));
    }
}
