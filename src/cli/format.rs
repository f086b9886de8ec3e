use anyhow::Result;

use crate::models::{Field, Resolution, SuggestionResult};

/// Render a `SuggestionResult` in human-readable text form.
///
/// Title suggestions are rendered as `display [#id]`, one per line;
/// author suggestions as the display name alone. A trailing summary
/// line notes when more entries matched than were shown.
pub fn print_suggestions_text(result: &SuggestionResult) -> Result<()> {
    if result.suggestions.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }

    for suggestion in &result.suggestions {
        match result.field {
            Field::Title => println!("{} [#{}]", suggestion.display, suggestion.id),
            Field::Author => println!("{}", suggestion.display),
        }
    }

    if result.summary.truncated {
        println!(
            "({} of {} matches shown)",
            result.suggestions.len(),
            result.summary.total_matches
        );
    }

    Ok(())
}

/// Render a `Resolution` as the target URL followed by its message.
pub fn print_resolution_text(resolution: &Resolution) -> Result<()> {
    println!("{}", resolution.url);
    println!("{}", resolution.message);
    Ok(())
}
