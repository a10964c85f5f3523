//! Peer rankings. The backend hands models anonymized answers ("Response A",
//! "Response B", ...); for display every label is swapped back to the model
//! id using the stage metadata.

use std::collections::BTreeMap;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use super::{BODY_FG, append_section, model_header, note};
use crate::core::stage::{AggregateRanking, Stage2Result, StageMetadata};
use crate::tui::markdown;

pub const NO_RANKINGS: &str = "No rankings received.";
pub const AGGREGATE_TITLE: &str = "Aggregate Rankings";

pub fn render(result: &Stage2Result, metadata: Option<&StageMetadata>) -> Text<'static> {
    let empty = BTreeMap::new();
    let labels = metadata.map(|m| &m.label_to_model).unwrap_or(&empty);

    let mut text = Text::default();
    if result.is_empty() {
        text.lines.push(note(NO_RANKINGS));
    } else {
        text.lines.push(note(
            "Each model ranked the anonymized answers. Labels are shown as the models they stood for.",
        ));
    }

    for ranking in result {
        let mut section = Text::from(model_header(&ranking.model, Color::Magenta));
        section.lines.extend(
            markdown::render(&deanonymize(&ranking.ranking, labels), BODY_FG).lines,
        );
        if !ranking.parsed_ranking.is_empty() {
            section.lines.push(Line::default());
            section.lines.push(note("Extracted ranking:"));
            for (i, label) in ranking.parsed_ranking.iter().enumerate() {
                let model = labels.get(label).unwrap_or(label);
                section.lines.push(Line::from(vec![
                    Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(model.clone(), Style::default().fg(BODY_FG)),
                ]));
            }
        }
        append_section(&mut text, section);
    }

    if let Some(aggregate) = metadata.and_then(|m| m.aggregate_rankings.as_deref())
        && !aggregate.is_empty()
    {
        append_section(&mut text, render_aggregate(aggregate));
    }
    text
}

/// Replaces every anonymous label with the bolded model id it stands for.
pub fn deanonymize(text: &str, label_to_model: &BTreeMap<String, String>) -> String {
    // Longest labels first so "Response AB" is not clobbered by "Response A"
    let mut labels: Vec<(&String, &String)> = label_to_model.iter().collect();
    labels.sort_by_key(|(label, _)| std::cmp::Reverse(label.len()));

    labels
        .into_iter()
        .fold(text.to_string(), |acc, (label, model)| {
            acc.replace(label.as_str(), &format!("**{model}**"))
        })
}

fn render_aggregate(aggregate: &[AggregateRanking]) -> Text<'static> {
    let mut text = Text::from(Line::from(Span::styled(
        AGGREGATE_TITLE,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));
    text.lines
        .push(note("Average position across all peer evaluations (lower is better)."));

    let name_width = aggregate.iter().map(|a| a.model.len()).max().unwrap_or(0);
    for (i, entry) in aggregate.iter().enumerate() {
        let votes = if entry.rankings_count == 1 { "vote" } else { "votes" };
        text.lines.push(Line::from(vec![
            Span::styled(
                format!("#{:<3}", i + 1),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!("{:<name_width$}", entry.model),
                Style::default().fg(BODY_FG),
            ),
            Span::styled(
                format!("  avg {:.2}  ({} {})", entry.average_rank, entry.rankings_count, votes),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    text
}
