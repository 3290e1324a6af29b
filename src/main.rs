use std::process::ExitCode;

use clap::Parser;
use clap_stdin::FileOrStdin;

use cminus::codegen::Quadruple;
use cminus::parser::Verdict;

/// C- compiler front end: prints the generated quadruples and an
/// ACCEPT/REJECT verdict for one source file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a C- source file, or `-` to read from stdin
    source: FileOrStdin,

    /// Only print the verdict, not the quadruple table
    #[arg(long)]
    no_quads: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match cli.source.contents() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("ERROR {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = cminus::compile(&source);

    for diagnostic in &outcome.diagnostics {
        eprintln!("{}", diagnostic);
    }

    if !cli.no_quads {
        print_quadruples(&outcome.quadruples);
    }
    println!("{}", outcome.verdict);

    match outcome.verdict {
        Verdict::Accept => ExitCode::SUCCESS,
        Verdict::Reject => ExitCode::FAILURE,
    }
}

/// Renders the quadruple list as a right-aligned five-column table.
fn print_quadruples(quadruples: &[Quadruple]) {
    const HEADERS: [&str; 5] = ["i", "opcode", "operand1", "operand2", "result"];

    let rows: Vec<[String; 5]> = quadruples
        .iter()
        .map(|q| {
            [
                q.index.to_string(),
                q.opcode.to_string(),
                q.operand1.clone(),
                q.operand2.clone(),
                q.result.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+";

    let render = |row: &[String]| {
        let cells: String = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("| {:>width$} ", cell, width = w))
            .collect();
        format!("{}|", cells)
    };

    println!("{}", separator);
    let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    println!("{}", render(&headers));
    println!("{}", separator);
    for row in &rows {
        println!("{}", render(row));
    }
    println!("{}", separator);
}
