//! Per-basename orchestration: preprocess, first pass, second pass, and
//! output artifact writing/cleanup (spec 5, 6)

use std::fs;
use std::path::PathBuf;

use crate::base4;
use crate::context::AssemblyContext;
use crate::error::Error;
use crate::first_pass;
use crate::logging;
use crate::macros;
use crate::second_pass;

/// Outcome of assembling one basename (spec 6)
pub struct FileOutcome {
    pub succeeded: bool,
    pub fatal: bool,
}

/// Tracks which `.ob`/`.ent`/`.ext` files have actually been created for
/// this basename, since they are opened lazily, so a non-clean outcome can
/// remove exactly those and nothing else (spec 5, 7)
struct OutputArtifacts {
    paths: Vec<PathBuf>,
}

impl OutputArtifacts {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    fn write(&mut self, path: PathBuf, contents: &str) -> Result<(), Error> {
        fs::write(&path, contents).map_err(|e| Error::WriteError { path: path.display().to_string(), message: e.to_string() })?;
        self.paths.push(path);
        Ok(())
    }

    fn remove_all(&self) {
        for path in &self.paths {
            let _ = fs::remove_file(path);
        }
    }
}

fn report(file_name: &str, error: &Error) {
    let message = match error.line() {
        Some(line) => format!("File {file_name}, line {line}: {error}"),
        None => format!("File {file_name}: {error}"),
    };
    logging::error(message);
}

fn entry_listing(output: &second_pass::Output) -> String {
    let mut text = String::new();
    for entry in &output.entries {
        text.push_str(&entry.name);
        text.push(' ');
        text.push_str(&base4::encode(entry.address as u32, 4));
        text.push('\n');
    }
    text
}

fn external_listing(output: &second_pass::Output) -> String {
    let mut text = String::new();
    for use_site in &output.externals {
        text.push_str(&use_site.name);
        text.push(' ');
        text.push_str(&base4::encode(use_site.address as u32, 4));
        text.push('\n');
    }
    text
}

fn object_file(output: &second_pass::Output) -> String {
    let mut text = output.header.clone();
    text.push('\n');
    for line in &output.body {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Assemble one basename: reads `<basename>.as`, writes the expanded
/// `<basename>.am`, and on a clean run writes `<basename>.ob` plus optional
/// `.ent`/`.ext` (spec 6). Returns whether the file succeeded and whether a
/// fatal error occurred (the caller aggregates this into the exit status).
pub fn run(basename: &str) -> FileOutcome {
    let source_path = format!("{basename}.as");
    let source = match fs::read_to_string(&source_path) {
        Ok(text) => text,
        Err(_) => {
            // inability to open the input is fatal (spec 7)
            report(basename, &Error::ReadError { path: source_path });
            return FileOutcome { succeeded: false, fatal: true };
        }
    };

    // preprocessor failures remove the (never-written) expanded
    // intermediate and skip the remaining passes, but the run continues
    // with the next basename (spec 7)
    let expansion = macros::preprocess(&source);
    if !expansion.errors.is_empty() {
        for error in &expansion.errors {
            report(basename, error);
        }
        return FileOutcome { succeeded: false, fatal: false };
    }

    // the `.am` intermediate is kept once the preprocessor succeeds, even
    // if the first or second pass later fails (spec 6)
    let am_path = PathBuf::from(format!("{basename}.am"));
    let am_contents = expansion.lines.join("\n") + "\n";
    if let Err(e) = fs::write(&am_path, &am_contents) {
        logging::error(format!("failed to write {}: {e}", am_path.display()));
        return FileOutcome { succeeded: false, fatal: true };
    }

    let mut ctx = AssemblyContext::new(basename);
    ctx.macro_names = expansion.macro_names;
    first_pass::run(&expansion.lines, &mut ctx);

    if ctx.is_fatal() {
        report(basename, ctx.fatal.as_ref().unwrap());
        return FileOutcome { succeeded: false, fatal: true };
    }

    // the second pass always runs, even over an already-errored file, so
    // that its diagnostics (missing symbols, address overflow) surface too
    // (spec 4.3); its output is simply discarded below if anything failed
    let output = second_pass::run(&mut ctx);

    if ctx.is_fatal() {
        report(basename, ctx.fatal.as_ref().unwrap());
        return FileOutcome { succeeded: false, fatal: true };
    }

    for error in &ctx.errors {
        report(basename, error);
    }

    if ctx.has_errors() {
        return FileOutcome { succeeded: false, fatal: false };
    }

    let mut artifacts = OutputArtifacts::new();

    if let Err(e) = artifacts.write(PathBuf::from(format!("{basename}.ob")), &object_file(&output)) {
        report(basename, &e);
        artifacts.remove_all();
        return FileOutcome { succeeded: false, fatal: true };
    }

    if !output.entries.is_empty() {
        if let Err(e) = artifacts.write(PathBuf::from(format!("{basename}.ent")), &entry_listing(&output)) {
            report(basename, &e);
            artifacts.remove_all();
            return FileOutcome { succeeded: false, fatal: true };
        }
    }

    if !output.externals.is_empty() {
        if let Err(e) = artifacts.write(PathBuf::from(format!("{basename}.ext")), &external_listing(&output)) {
            report(basename, &e);
            artifacts.remove_all();
            return FileOutcome { succeeded: false, fatal: true };
        }
    }

    FileOutcome { succeeded: true, fatal: false }
}
