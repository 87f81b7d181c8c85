//! Reading the game to review from arguments or a file.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read moves file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("moves given both as arguments and in a file")]
    Ambiguous,
}

/// Split a move list into UCI tokens.
///
/// Tokens may be separated by whitespace or commas. Move numbers (`1.`,
/// `12...`), game results and `#` comments running to the end of a line
/// are dropped.
pub fn parse_move_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || c == ','))
        .filter(|token| !token.is_empty())
        .filter(|token| !is_move_number(token) && !is_result(token))
        .map(str::to_string)
        .collect()
}

fn is_move_number(token: &str) -> bool {
    let digits = token.trim_end_matches('.');
    digits.len() < token.len() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_result(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

/// Collect the moves from positional arguments or a file, not both.
pub fn collect_moves(args: &[String], file: Option<&Path>) -> Result<Vec<String>, InputError> {
    match file {
        Some(_) if !args.is_empty() => Err(InputError::Ambiguous),
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| InputError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(parse_move_list(&text))
        }
        None => Ok(parse_move_list(&args.join(" "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_plain_list() {
        assert_eq!(parse_move_list("e2e4 e7e5\ng1f3"), vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_parse_drops_numbers_results_and_comments() {
        let text = "# Scholar's mate\n1. e2e4 e7e5 2. d1h5 b8c6 3. f1c4 g8f6 4. h5f7 1-0";
        assert_eq!(
            parse_move_list(text),
            vec!["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6", "h5f7"]
        );
    }

    #[test]
    fn test_parse_black_continuation_number() {
        assert_eq!(parse_move_list("12... e7e5, g1f3"), vec!["e7e5", "g1f3"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_move_list("  \n# nothing\n").is_empty());
    }

    #[test]
    fn test_collect_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
        writeln!(file, "1. e2e4 e7e5").unwrap();
        writeln!(file, "2. g1f3 *").unwrap();

        let moves = collect_moves(&[], Some(file.path())).unwrap();
        assert_eq!(moves, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_collect_rejects_both_sources() {
        let file = tempfile::NamedTempFile::new().expect("failed to create temp file");
        let err = collect_moves(&["e2e4".to_string()], Some(file.path())).unwrap_err();
        assert!(matches!(err, InputError::Ambiguous));
    }

    #[test]
    fn test_collect_missing_file() {
        let err = collect_moves(&[], Some(Path::new("/nonexistent/moves.txt"))).unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
