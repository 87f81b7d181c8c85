use crate::EngineInfo;
use chess::{parse_uci_move, Score};

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`, sent in mated or stalemated positions.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    Info(EngineInfo),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let mv = match tokens.get(1) {
                None => return Err(crate::UciError::MalformedMessage(line.to_string())),
                Some(&"(none)") | Some(&"0000") => None,
                Some(token) => Some(checked_move(token)?),
            };
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(token)) => Some(checked_move(token)?),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

fn checked_move(token: &str) -> Result<String, crate::UciError> {
    parse_uci_move(token)?;
    Ok(token.to_string())
}

/// Parse an "info" line from the engine
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "lowerbound" | "upperbound" => {
                info.bound = true;
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if parse_uci_move(tokens[i]).is_ok() {
                        info.pv.push(tokens[i].to_string());
                    }
                    i += 1;
                }
                continue; // Don't increment i again
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "string" => {
                // Free text runs to the end of the line
                break;
            }
            _ => {
                // seldepth, nodes, nps, time, hashfull, currmove and their
                // values are not needed
            }
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
            | "wdl"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(line: &str) -> EngineInfo {
        match parse_uci_message(line).unwrap() {
            UciMessage::Info(info) => info,
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove { mv, ponder } => {
                assert_eq!(mv.as_deref(), Some("e2e4"));
                assert_eq!(ponder.as_deref(), Some("e7e5"));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_uci_message("bestmove (none)").unwrap();
        assert!(matches!(msg, UciMessage::BestMove { mv: None, ponder: None }));
    }

    #[test]
    fn test_parse_bestmove_rejects_garbage() {
        assert!(parse_uci_message("bestmove").is_err());
        assert!(parse_uci_message("bestmove zz99").is_err());
    }

    #[test]
    fn test_parse_info() {
        let info = info("info depth 12 score cp 35 nodes 15234 pv e2e4 e7e5");
        assert_eq!(info.depth, Some(12));
        assert_eq!(info.score, Some(Score::Centipawns(35)));
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(info.multipv, None);
        assert!(!info.bound);
    }

    #[test]
    fn test_parse_info_multipv_line() {
        let info = info(
            "info depth 18 seldepth 24 multipv 2 score cp -41 nodes 912345 nps 1200000 \
             hashfull 120 tbhits 0 time 760 currmove g1f3 pv g1f3 b8c6 f1b5",
        );
        assert_eq!(info.depth, Some(18));
        assert_eq!(info.multipv, Some(2));
        assert_eq!(info.score, Some(Score::Centipawns(-41)));
        assert_eq!(info.pv, vec!["g1f3", "b8c6", "f1b5"]);
    }

    #[test]
    fn test_parse_info_mate_scores() {
        let winning = info("info depth 20 multipv 1 score mate 3 pv d8h4");
        assert_eq!(winning.score, Some(Score::Mate(3)));

        let losing = info("info depth 20 multipv 1 score mate -2 pv e1e2 d8h4");
        assert_eq!(losing.score, Some(Score::Mate(-2)));
    }

    #[test]
    fn test_parse_info_bound_flag() {
        let info = info("info depth 9 score cp 80 lowerbound nodes 1000 pv e2e4");
        assert!(info.bound);
        assert_eq!(info.score, Some(Score::Centipawns(80)));
        assert_eq!(info.pv, vec!["e2e4"]);
    }

    #[test]
    fn test_parse_info_string_is_ignored() {
        let info = info("info string NNUE evaluation using nn-1111.nnue enabled");
        assert!(info.score.is_none());
        assert!(info.pv.is_empty());
    }

    #[test]
    fn test_parse_info_promotion_in_pv() {
        let info = info("info depth 5 score cp 900 pv e7e8q d8e8");
        assert_eq!(info.pv, vec!["e7e8q", "d8e8"]);
    }

    #[test]
    fn test_parse_id_and_handshake() {
        assert!(matches!(parse_uci_message("uciok").unwrap(), UciMessage::UciOk));
        assert!(matches!(parse_uci_message("readyok").unwrap(), UciMessage::ReadyOk));
        match parse_uci_message("id name Stockfish 16").unwrap() {
            UciMessage::Id { name, value } => {
                assert_eq!(name, "name");
                assert_eq!(value, "Stockfish 16");
            }
            _ => panic!("Wrong message type"),
        }
        assert!(parse_uci_message("option name Hash type spin").is_err());
    }
}
