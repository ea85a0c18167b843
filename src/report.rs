use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::Insights;
use crate::models::WorkoutSession;

const RECENT_SESSIONS: usize = 5;

/// `MM:SS`, minutes keep counting past an hour.
pub fn format_duration(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn session_volume(session: &WorkoutSession) -> f64 {
    session
        .exercises
        .iter()
        .filter(|exercise| exercise.sets > 0)
        .map(|exercise| f64::from(exercise.sets) * f64::from(exercise.reps) * exercise.weight)
        .sum()
}

fn describe_session(session: &WorkoutSession) -> String {
    format!(
        "{} {} session, {} ({} exercises, volume {:.1})",
        session.date,
        session.workout_type,
        format_duration(session.duration_seconds),
        session.exercises.len(),
        session_volume(session)
    )
}

/// Newest-first listing for the terminal. Expects `sessions` already sorted.
pub fn render_history(sessions: &[WorkoutSession], limit: usize) -> String {
    let mut output = String::new();
    for session in sessions.iter().take(limit) {
        let _ = writeln!(output, "- {}", describe_session(session));
        for exercise in &session.exercises {
            let _ = write!(
                output,
                "    {}: {}x{} @ {}",
                exercise.name, exercise.sets, exercise.reps, exercise.weight
            );
            if let Some(comment) = &exercise.comment {
                let _ = write!(output, " ({comment})");
            }
            let _ = writeln!(output);
        }
    }
    output
}

pub fn build_report(
    since: Option<NaiveDate>,
    insights: &Insights,
    sessions: &[WorkoutSession],
) -> String {
    let mut output = String::new();
    let window = match since {
        Some(cutoff) => format!("sets logged since {cutoff}"),
        None => "all logged sets".to_string(),
    };

    let _ = writeln!(output, "# Workout Insights Report");
    let _ = writeln!(output, "Generated from {window}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Total Weight Lifted Per Day");

    if insights.total_weight_by_day.is_empty() {
        let _ = writeln!(output, "No workout data recorded for this window.");
    } else {
        for entry in &insights.total_weight_by_day {
            let _ = writeln!(output, "- {}: {:.1}", entry.day, entry.total_weight);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Volume Over Time");

    if insights.volume_over_time.is_empty() {
        let _ = writeln!(output, "No workout data recorded for this window.");
    } else {
        let mut previous: Option<f64> = None;
        for point in &insights.volume_over_time {
            match previous {
                Some(last) => {
                    let _ = writeln!(
                        output,
                        "- {}: {:.1} ({:+.1} vs previous)",
                        point.day,
                        point.volume,
                        point.volume - last
                    );
                }
                None => {
                    let _ = writeln!(output, "- {}: {:.1}", point.day, point.volume);
                }
            }
            previous = Some(point.volume);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Performed Exercises");

    if insights.exercise_frequency.is_empty() {
        let _ = writeln!(output, "No exercises recorded for this window.");
    } else {
        for entry in &insights.exercise_frequency {
            let _ = writeln!(output, "- {}: {} sets", entry.exercise, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Personal Records");

    if insights.personal_records.is_empty() {
        let _ = writeln!(output, "No exercises recorded for this window.");
    } else {
        for entry in &insights.personal_records {
            let _ = writeln!(output, "- {}: {:.1}", entry.exercise, entry.max_weight);
        }
    }

    if !insights.rejected.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Skipped Records");
        let _ = writeln!(
            output,
            "{} records could not be aggregated and are excluded above.",
            insights.rejected.len()
        );
        for rejected in &insights.rejected {
            let _ = writeln!(output, "- {rejected}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Sessions");

    if sessions.is_empty() {
        let _ = writeln!(output, "No sessions logged yet.");
    } else {
        for session in sessions.iter().take(RECENT_SESSIONS) {
            let _ = writeln!(output, "- {}", describe_session(session));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::models::{Exercise, WorkoutRecord, WorkoutType};
    use uuid::Uuid;

    fn session(date: &str, exercises: Vec<Exercise>) -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            date: date.to_string(),
            workout_type: WorkoutType::Strength,
            duration_seconds: 3_725,
            exercises,
        }
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3_725), "62:05");
    }

    #[test]
    fn session_volume_ignores_empty_sets() {
        let session = session(
            "2025-05-01T08:00:00.000Z",
            vec![
                "Squats:3x12@135".parse().unwrap(),
                "Bench Press:0x10@155".parse().unwrap(),
            ],
        );
        assert_eq!(session_volume(&session), 3.0 * 12.0 * 135.0);
    }

    #[test]
    fn report_lists_every_section() {
        let sessions = vec![session(
            "2025-05-02T08:00:00.000Z",
            vec!["Squats:2x5@100".parse().unwrap()],
        )];
        let mut records: Vec<WorkoutRecord> =
            sessions.iter().flat_map(WorkoutSession::to_records).collect();
        records.push(WorkoutRecord {
            date: "2025-05-01".to_string(),
            exercise_name: "Squats".to_string(),
            weight: 80.0,
            repetitions: 5,
            comment: None,
        });
        records.push(WorkoutRecord {
            date: "bad".to_string(),
            exercise_name: "Row".to_string(),
            weight: 50.0,
            repetitions: 10,
            comment: None,
        });
        let insights = summarize(&records, None);
        let report = build_report(None, &insights, &sessions);

        assert!(report.contains("## Total Weight Lifted Per Day"));
        assert!(report.contains("- 2025-05-01: 400.0"));
        assert!(report.contains("- 2025-05-02: 1000.0 (+600.0 vs previous)"));
        assert!(report.contains("- Squats: 3 sets"));
        assert!(report.contains("- Squats: 100.0"));
        assert!(report.contains("## Skipped Records"));
        assert!(report.contains("strength session, 62:05 (1 exercises, volume 1000.0)"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(None, &Insights::default(), &[]);
        assert!(report.contains("No workout data recorded for this window."));
        assert!(report.contains("No sessions logged yet."));
        assert!(!report.contains("## Skipped Records"));
    }

    #[test]
    fn history_respects_limit() {
        let sessions = vec![
            session("2025-05-03T08:00:00.000Z", vec!["Squats:3x5@100".parse().unwrap()]),
            session("2025-05-02T08:00:00.000Z", vec!["Bench Press:3x5@80".parse().unwrap()]),
        ];
        let history = render_history(&sessions, 1);
        assert!(history.contains("2025-05-03"));
        assert!(history.contains("    Squats: 3x5 @ 100"));
        assert!(!history.contains("Bench Press"));
    }
}
