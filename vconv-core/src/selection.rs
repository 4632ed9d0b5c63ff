// ============================================================================
// vconv-core/src/selection.rs
// ============================================================================
//
// INTERACTIVE SELECTION: Choosing Which Files to Convert
//
// A small state machine driven by one token per input line. The transition
// function is pure; `prompt_selection` wraps it in a loop over any reader and
// writer, so the same logic serves a terminal and a test buffer.
//
// AwaitingInput --"a"/"all"-----------> ConvertAll
//               --"<n>" (convertible)--> ConvertOne(n)
//               --"q"/"quit"----------> Quit
//               --anything else-------> Invalid --> AwaitingInput

use crate::error::CoreResult;
use crate::media::MediaProfile;

use log::debug;

use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    AwaitingInput,
    ConvertAll,
    /// 1-based row number as displayed
    ConvertOne(usize),
    Quit,
    Invalid,
}

impl SelectionState {
    /// Whether the state ends the prompt loop.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(
            self,
            SelectionState::ConvertAll | SelectionState::ConvertOne(_) | SelectionState::Quit
        )
    }
}

/// Applies one input token to `state`.
///
/// Final states absorb further input. Tokens are trimmed and lower-cased.
#[must_use]
pub fn transition(state: SelectionState, token: &str, items: &[MediaProfile]) -> SelectionState {
    if state.is_final() {
        return state;
    }

    let token = token.trim().to_lowercase();
    match token.as_str() {
        "a" | "all" => SelectionState::ConvertAll,
        "q" | "quit" => SelectionState::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) && items[n - 1].is_valid() => {
                SelectionState::ConvertOne(n)
            }
            _ => SelectionState::Invalid,
        },
    }
}

/// Moves an `Invalid` state back to `AwaitingInput`.
#[must_use]
pub fn settle(state: SelectionState) -> SelectionState {
    match state {
        SelectionState::Invalid => SelectionState::AwaitingInput,
        other => other,
    }
}

/// Prompts until a final state is reached. End of input resolves to `Quit`.
pub fn prompt_selection<R, W>(
    reader: &mut R,
    writer: &mut W,
    items: &[MediaProfile],
) -> CoreResult<SelectionState>
where
    R: BufRead,
    W: Write,
{
    let mut state = SelectionState::AwaitingInput;
    let mut line = String::new();

    while !state.is_final() {
        write!(
            writer,
            "Options: [a] convert all, [1-{}] convert one, [q] quit\n> ",
            items.len()
        )?;
        writer.flush()?;

        line.clear();
        if reader.read_line(&mut line)? == 0 {
            debug!("Selection input closed, quitting");
            writeln!(writer)?;
            return Ok(SelectionState::Quit);
        }

        state = transition(state, &line, items);
        if state == SelectionState::Invalid {
            writeln!(
                writer,
                "Invalid choice '{}'. Enter 'a', the number of a readable file, or 'q'.",
                line.trim()
            )?;
        }
        state = settle(state);
    }

    debug!("Selection resolved to {state:?}");
    Ok(state)
}

/// Indices (0-based) of the profiles a final state selects.
#[must_use]
pub fn selected_indices(state: SelectionState, items: &[MediaProfile]) -> Vec<usize> {
    match state {
        SelectionState::ConvertAll => items
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_valid())
            .map(|(i, _)| i)
            .collect(),
        SelectionState::ConvertOne(n) if n >= 1 && n <= items.len() && items[n - 1].is_valid() => {
            vec![n - 1]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ProbeFailure, ProbeOutcome, ProbeResult, classify};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn valid(name: &str) -> MediaProfile {
        classify(ProbeOutcome::Probed(ProbeResult {
            path: PathBuf::from(name),
            size: 1,
            container: "AVI".to_string(),
            video_codec: "huffyuv".to_string(),
            audio_codec: None,
            width: None,
            height: None,
            frame_rate: None,
            duration_secs: None,
            bit_rate: None,
            raw_output: None,
        }))
    }

    fn unreadable(name: &str) -> MediaProfile {
        classify(ProbeOutcome::Failed(ProbeFailure {
            path: PathBuf::from(name),
            size: 1,
            reason: "no video stream found".to_string(),
            byte_sample: vec![0],
            raw_output: None,
        }))
    }

    fn three() -> Vec<MediaProfile> {
        vec![valid("a.avi"), valid("b.avi"), valid("c.avi")]
    }

    #[test]
    fn test_invalid_then_number() {
        let items = three();
        let mut states = Vec::new();
        let mut state = SelectionState::AwaitingInput;
        states.push(state);
        for token in ["x", "2"] {
            state = settle(transition(state, token, &items));
            states.push(state);
        }
        assert_eq!(
            states,
            vec![
                SelectionState::AwaitingInput,
                SelectionState::AwaitingInput,
                SelectionState::ConvertOne(2)
            ]
        );
    }

    #[test]
    fn test_tokens() {
        let items = three();
        let from = SelectionState::AwaitingInput;
        assert_eq!(transition(from, "q", &items), SelectionState::Quit);
        assert_eq!(transition(from, " QUIT \n", &items), SelectionState::Quit);
        assert_eq!(transition(from, "A", &items), SelectionState::ConvertAll);
        assert_eq!(transition(from, "all", &items), SelectionState::ConvertAll);
        assert_eq!(transition(from, "3", &items), SelectionState::ConvertOne(3));
        assert_eq!(transition(from, "0", &items), SelectionState::Invalid);
        assert_eq!(transition(from, "4", &items), SelectionState::Invalid);
        assert_eq!(transition(from, "-1", &items), SelectionState::Invalid);
        assert_eq!(transition(from, "", &items), SelectionState::Invalid);
        assert_eq!(transition(SelectionState::Quit, "a", &items), SelectionState::Quit);
    }

    #[test]
    fn test_unreadable_row_is_invalid() {
        let items = vec![valid("a.avi"), unreadable("b.bin")];
        assert_eq!(
            transition(SelectionState::AwaitingInput, "2", &items),
            SelectionState::Invalid
        );
        assert_eq!(
            selected_indices(SelectionState::ConvertAll, &items),
            vec![0]
        );
    }

    #[test]
    fn test_prompt_loop_reprompts() {
        let items = three();
        let mut input = Cursor::new("\nnope\n2\n");
        let mut output = Vec::new();

        let state = prompt_selection(&mut input, &mut output, &items).unwrap();
        assert_eq!(state, SelectionState::ConvertOne(2));

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Options:").count(), 3);
        assert_eq!(text.matches("Invalid choice").count(), 2);
        assert!(text.contains("Invalid choice 'nope'"));
    }

    #[test]
    fn test_prompt_eof_quits() {
        let items = three();
        let mut input = Cursor::new("bogus\n");
        let mut output = Vec::new();
        assert_eq!(
            prompt_selection(&mut input, &mut output, &items).unwrap(),
            SelectionState::Quit
        );
    }

    #[test]
    fn test_selected_indices() {
        let items = three();
        assert_eq!(selected_indices(SelectionState::ConvertOne(1), &items), vec![0]);
        assert_eq!(selected_indices(SelectionState::ConvertAll, &items), vec![0, 1, 2]);
        assert!(selected_indices(SelectionState::Quit, &items).is_empty());
    }
}
