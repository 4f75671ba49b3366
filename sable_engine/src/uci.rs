//! The thin UCI front end: translates protocol text into controller
//! calls. Carries no engine logic of its own.

use std::io::{self, BufRead};
use std::time::Instant;

use sable::Player;

use crate::engine::Engine;
use crate::time_manager::Limits;

/// Runs the UCI read-eval loop until `quit`.
pub fn main_loop() {
    let mut engine = Engine::new();
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if !dispatch(&mut engine, &line) {
            break;
        }
    }
    engine.stop();
    engine.wait();
}

/// Handles a single command line; returns false on `quit`.
pub fn dispatch(engine: &mut Engine, line: &str) -> bool {
    let arrival = Instant::now();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&command) = tokens.first() else {
        return true;
    };

    match command {
        "uci" => engine.print_uci(),
        "isready" => println!("readyok"),
        "ucinewgame" => engine.new_game(),
        "setoption" => parse_setoption(engine, &tokens),
        "position" => parse_position(engine, &tokens),
        "go" => engine.go(parse_go(&tokens, arrival)),
        "stop" => engine.stop(),
        "perft" => {
            let depth = tokens.get(1).and_then(|d| d.parse().ok()).unwrap_or(5);
            engine.perft(depth);
        }
        "d" => println!("{}", engine.board()),
        "quit" => return false,
        _ => {}
    }
    true
}

// setoption name <name...> [value <value...>]
fn parse_setoption(engine: &mut Engine, tokens: &[&str]) {
    let mut name = Vec::new();
    let mut value = Vec::new();
    let mut target: Option<&mut Vec<&str>> = None;

    for &tok in &tokens[1..] {
        match tok {
            "name" => target = Some(&mut name),
            "value" => target = Some(&mut value),
            other => {
                if let Some(ref mut t) = target {
                    t.push(other);
                }
            }
        }
    }

    engine.set_option(&name.join(" "), &value.join(" "));
}

// position [startpos | fen <fen...>] [moves <move...>]
fn parse_position(engine: &mut Engine, tokens: &[&str]) {
    let moves_at = tokens.iter().position(|&t| t == "moves");
    let moves: Vec<&str> = match moves_at {
        Some(i) => tokens[i + 1..].to_vec(),
        None => Vec::new(),
    };

    let fen = match tokens.get(1) {
        Some(&"startpos") | None => None,
        Some(&"fen") => {
            let end = moves_at.unwrap_or(tokens.len());
            Some(tokens[2..end].join(" "))
        }
        Some(_) => return,
    };

    engine.set_position(fen.as_deref(), &moves);
}

// go [wtime x] [btime x] [winc x] [binc x] [movestogo x] [depth x]
//    [nodes x] [movetime x] [infinite]
fn parse_go(tokens: &[&str], arrival: Instant) -> Limits {
    let mut limits = Limits::blank();
    limits.start = arrival;

    let mut it = tokens[1..].iter();
    while let Some(&tok) = it.next() {
        match tok {
            "wtime" => {
                limits.time[Player::White as usize] = next_parsed(&mut it).unwrap_or(0);
            }
            "btime" => {
                limits.time[Player::Black as usize] = next_parsed(&mut it).unwrap_or(0);
            }
            "winc" => {
                limits.inc[Player::White as usize] = next_parsed(&mut it).unwrap_or(0);
            }
            "binc" => {
                limits.inc[Player::Black as usize] = next_parsed(&mut it).unwrap_or(0);
            }
            "movestogo" => {
                limits.moves_to_go = next_parsed(&mut it).unwrap_or(0);
            }
            "depth" => limits.depth = next_parsed(&mut it),
            "nodes" => limits.nodes = next_parsed(&mut it),
            "movetime" => limits.movetime = next_parsed(&mut it),
            "infinite" => limits.infinite = true,
            _ => {}
        }
    }
    limits
}

fn next_parsed<'a, T: std::str::FromStr, I: Iterator<Item = &'a &'a str>>(
    it: &mut I,
) -> Option<T> {
    it.next().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_parsing() {
        let tokens: Vec<&str> = "go wtime 30000 btime 20000 winc 100 binc 200 movestogo 12"
            .split_whitespace()
            .collect();
        let limits = parse_go(&tokens, Instant::now());
        assert_eq!(limits.time, [30000, 20000]);
        assert_eq!(limits.inc, [100, 200]);
        assert_eq!(limits.moves_to_go, 12);
        assert!(limits.use_time_management());

        let tokens: Vec<&str> = "go movetime 1500".split_whitespace().collect();
        let limits = parse_go(&tokens, Instant::now());
        assert_eq!(limits.movetime, Some(1500));
        assert!(!limits.use_time_management());

        let tokens: Vec<&str> = "go depth 9".split_whitespace().collect();
        let limits = parse_go(&tokens, Instant::now());
        assert_eq!(limits.depth, Some(9));
    }
}
