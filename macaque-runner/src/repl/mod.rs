mod printer;
mod reader;

use std::ops::ControlFlow;

use macaque_interpreter::{ContextOptions, Session};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use printer::Printer;
use reader::{ReadOutput, Reader};

struct Repl {
    reader: Reader,
    session: Session,
    printer: Printer,
}

impl Repl {
    fn run(mut self) {
        loop {
            match self.reader.read() {
                ReadOutput::ControlFlow(ControlFlow::Break(())) => break,
                ReadOutput::ControlFlow(ControlFlow::Continue(())) => continue,
                ReadOutput::Value(program) => {
                    let result = self.session.run_program(program);
                    self.printer.print(result)
                }
            }
        }
    }
}

/// Reads lines until end of input. Bindings and macros carry over from
/// one line to the next.
pub fn start(options: ContextOptions) -> Result<(), ReadlineError> {
    let editor = DefaultEditor::new()?;

    Repl {
        reader: Reader::new(editor),
        session: Session::new(options),
        printer: Printer {},
    }
    .run();
    Ok(())
}
