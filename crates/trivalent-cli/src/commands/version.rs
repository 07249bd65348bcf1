//! Version command implementation.

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("trivalent {VERSION}");
    println!();
    println!("Predicate-combining logic-bug finder for SQL engines.");
    println!();
    println!("Build info:");
    println!("  Backend:      DuckDB");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
}
