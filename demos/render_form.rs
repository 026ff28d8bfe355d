//! Generic Form Renderer
//!
//! Renders a template JSON with input data, over a background PDF when one
//! is given (or named by the template's `pdfFilePath`).
//!
//! Usage:
//!   cargo run --example render_form -- <template.json> <input.json> [background.pdf] [output.pdf]
//!
//! Examples:
//!   cargo run --example render_form -- assets/invoice.json input/invoice_input.json
//!   cargo run --example render_form -- assets/invoice.json input/invoice_input.json assets/invoice.pdf output/invoice.pdf

use std::path::Path;
use template::{parse_template, FillEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} <template.json> <input.json> [background.pdf] [output.pdf]",
            args[0]
        );
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --example render_form -- assets/invoice.json input/invoice_input.json");
        eprintln!("  cargo run --example render_form -- assets/invoice.json input/invoice_input.json assets/invoice.pdf");
        std::process::exit(1);
    }

    let template_path = &args[1];
    let input_path = &args[2];
    let background = args.get(3).map(Path::new);

    // Derive output path from template name if not provided
    let output_path = if args.len() > 4 {
        args[4].clone()
    } else {
        let template_name = Path::new(template_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        // Remove _template suffix if present
        let name = template_name.trim_end_matches("_template");
        format!("output/{}.pdf", name)
    };

    // Create output directory
    if let Some(parent) = Path::new(&output_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Load template JSON
    let template_json = std::fs::read_to_string(template_path)
        .map_err(|e| format!("Failed to read template '{}': {}", template_path, e))?;
    let template = parse_template(&template_json)?;

    // Load input data
    let input_json = std::fs::read_to_string(input_path)
        .map_err(|e| format!("Failed to read input '{}': {}", input_path, e))?;
    let data: serde_json::Value = serde_json::from_str(&input_json)?;

    // Render PDF
    let rendered = FillEngine::new().render(&template, &data, background)?;

    // Save output
    std::fs::write(&output_path, &rendered.bytes)?;

    println!("Generated: {} ({})", output_path, rendered.strategy);

    Ok(())
}
