use annai::interpreter::AdapterEvent;
use annai::prelude::*;
use annai::source::Ceiling;
use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::fs;
use std::io::{self, BufRead, Write};
use std::time::Instant;

/// Compile and run guided dialogue procedures
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a procedure into a graph document and/or binary artifact
    Compile {
        /// Path to the procedure JSON file
        procedure_path: String,
        #[command(flatten)]
        source: SourceArgs,
        /// Where to write the graph document (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Where to write the binary graph artifact
        #[arg(long)]
        binary: Option<String>,
    },
    /// Print a summary of a compiled graph
    Inspect {
        /// Path to a graph document, or a binary artifact with --binary
        graph_path: String,
        #[arg(long)]
        binary: bool,
    },
    /// Run a dialogue in the terminal
    Run {
        /// Path to a procedure, a graph document (--graph) or an artifact (--binary)
        path: String,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, conflicts_with = "binary")]
        graph: bool,
        #[arg(long)]
        binary: bool,
        /// Answer prompts from a file, one response per line
        #[arg(long)]
        script: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Read the procedure as an authoring-tool configuration document
    #[arg(long)]
    configuration: bool,
    /// Declare a ceiling rule, e.g. `payoutAmount=200000`
    #[arg(long = "ceiling", value_parser = parse_ceiling)]
    ceilings: Vec<(String, f64)>,
}

fn parse_ceiling(arg: &str) -> Result<(String, f64), String> {
    let (field, limit) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=LIMIT, got '{}'", arg))?;
    let limit = limit
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid limit '{}': {}", limit, e))?;
    Ok((field.trim().to_string(), limit))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile {
            procedure_path,
            source,
            output,
            binary,
        } => run_compile(&procedure_path, &source, output, binary),
        Command::Inspect { graph_path, binary } => {
            let graph = load_graph(&graph_path, binary);
            print_summary(&graph);
        }
        Command::Run {
            path,
            source,
            graph,
            binary,
            script,
        } => {
            let graph = if graph || binary {
                load_graph(&path, binary)
            } else {
                compile_procedure(&path, &source)
            };
            run_dialogue(&graph, script);
        }
    }
}

fn load_procedure(path: &str, source: &SourceArgs) -> ProcedureDefinition {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read procedure file '{}': {}", path, e))
    });

    let mut procedure = if source.configuration {
        ConfigurationDocument::from_json(&json)
            .and_then(IntoProcedure::into_procedure)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert configuration: {}", e)))
    } else {
        serde_json::from_str::<ProcedureDefinition>(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse procedure JSON: {}", e)))
    };

    for (field, limit) in &source.ceilings {
        let index = procedure.domain_data.len() as u32 + 1;
        let variable = procedure
            .domain_data
            .entry(field.clone())
            .or_insert_with(|| DomainVariable::new(index, field.clone()));
        variable.ceiling = Some(Ceiling {
            limit: *limit,
            target: None,
        });
    }
    procedure
}

fn compile_procedure(path: &str, source: &SourceArgs) -> DialogueGraph {
    let procedure = load_procedure(path, source);

    let compile_start = Instant::now();
    let graph = Compiler::builder(procedure)
        .build()
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    eprintln!(
        "Compilation successful! {} screens generated in {:?}",
        graph.len(),
        compile_start.elapsed()
    );
    graph
}

fn run_compile(path: &str, source: &SourceArgs, output: Option<String>, binary: Option<String>) {
    let graph = compile_procedure(path, source);

    if let Some(binary_path) = binary {
        graph
            .save(&binary_path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save artifact: {}", e)));
        eprintln!("Binary artifact written to '{}'", binary_path);
    }

    let json = graph
        .to_json()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write graph document: {}", e)));
    match output {
        Some(output_path) => {
            fs::write(&output_path, json).unwrap_or_else(|e| {
                exit_with_error(&format!("Could not write to file '{}': {}", output_path, e))
            });
            eprintln!("Graph document written to '{}'", output_path);
        }
        None => println!("{}", json),
    }
}

fn load_graph(path: &str, binary: bool) -> DialogueGraph {
    if binary {
        return DialogueGraph::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load artifact '{}': {}", path, e))
        });
    }
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read graph file '{}': {}", path, e))
    });
    DialogueGraph::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load graph document: {}", e)))
}

fn print_summary(graph: &DialogueGraph) {
    println!("--- Dialogue Graph ---");
    println!("Entry screen:      {}", graph.entry);
    println!("Screens:           {}", graph.len());
    println!("Code definitions:  {}", graph.code_definitions.keys().join(", "));
    println!();

    for screen in &graph.screens {
        let kind = match &screen.kind {
            ScreenKind::Choice { display, .. } if !display.is_empty() => "confirm",
            ScreenKind::Choice { .. } => "choice",
            ScreenKind::Input { .. } => "input",
            ScreenKind::Condition { .. } => "condition",
            ScreenKind::Terminal { end } => match end {
                EndType::Success => "end:success",
                EndType::Error => "end:error",
            },
        };
        let targets = screen
            .transitions
            .iter()
            .map(|t| t.target)
            .dedup()
            .join(", ");
        let title = screen.prompt.lines().next().unwrap_or_default();
        println!(
            "{:>4}  {:<12} {:<40} -> [{}]",
            screen.id, kind, title, targets
        );
    }
}

fn run_dialogue(graph: &DialogueGraph, script: Option<String>) {
    let interpreter = Interpreter::new(graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid dialogue graph: {}", e)));
    let mut session = interpreter.session();

    let outcome = match script {
        Some(script_path) => {
            let responses = fs::read_to_string(&script_path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read script '{}': {}", script_path, e))
            });
            let mut adapter = ScriptedAdapter::new(responses.lines().map(str::trim));
            let outcome = session.run(&mut adapter);
            print_transcript(adapter.transcript());
            outcome
        }
        None => session.run(&mut TerminalAdapter),
    };

    match outcome {
        Ok(StepOutcome::Finished { end, .. }) => println!("\n-> Dialogue finished ({})", end),
        Ok(outcome) => println!("\n-> Dialogue stopped: {:?}", outcome),
        Err(e) => exit_with_error(&format!("Dialogue failed: {}", e)),
    }

    let snapshot = session
        .snapshot()
        .to_json()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize session: {}", e)));
    println!("\n--- Session State ---\n{}", snapshot);
}

fn print_transcript(events: &[AdapterEvent]) {
    for event in events {
        match event {
            AdapterEvent::ChoicePrompt { text, choices } => {
                println!("\n{}", text);
                if !choices.is_empty() {
                    println!("  [{}]", choices.iter().join(" / "));
                }
            }
            AdapterEvent::InputPrompt { text } => println!("\n{}", text),
            AdapterEvent::Terminal { text, end } => println!("\n{} ({})", text, end),
            AdapterEvent::ValidationError(message) => println!("  ! {}", message),
        }
    }
}

/// Reads responses from stdin. Choices may be answered by label or number.
struct TerminalAdapter;

impl TerminalAdapter {
    /// An exact label wins over a 1-based number, so numeric labels stay
    /// reachable. Anything else is passed through unchanged.
    fn resolve_choice(answer: String, choices: &[String]) -> String {
        if choices.contains(&answer) {
            return answer;
        }
        answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| choices.get(i))
            .cloned()
            .unwrap_or(answer)
    }

    fn read_line(prompt: &str) -> Option<String> {
        print!("{}> ", prompt);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl PresentationAdapter for TerminalAdapter {
    fn show_choice_prompt(&mut self, text: &str, choices: &[String]) -> Option<String> {
        println!("\n{}", text);
        for (index, choice) in choices.iter().enumerate() {
            println!("  {}: {}", index + 1, choice);
        }
        let answer = Self::read_line("")?;
        Some(Self::resolve_choice(answer, choices))
    }

    fn show_input_prompt(&mut self, text: &str, validation: &ValidationSpec) -> Option<String> {
        println!("\n{}", text);
        let hint = match (validation.min, validation.max) {
            (Some(min), Some(max)) => format!("[{} - {}] ", min, max),
            _ => String::new(),
        };
        Self::read_line(&hint)
    }

    fn show_terminal(&mut self, text: &str, end: EndType) {
        println!("\n{} ({})", text, end);
    }

    fn show_validation_error(&mut self, message: &str) {
        println!("  ! {}", message);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
