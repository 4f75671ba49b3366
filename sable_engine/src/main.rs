//! The engine executable: a UCI loop over stdin/stdout.

extern crate sable_engine;

use sable_engine::uci;

fn main() {
    println!("Sable, a UCI chess engine");
    uci::main_loop();
}
