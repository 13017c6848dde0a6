use std::ops::ControlFlow;

use macaque_core::ast::Program;
use macaque_core::parse;
use macaque_interpreter::RunError;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = ">> ";

pub enum ReadOutput {
    ControlFlow(ControlFlow<()>),
    Value(Program),
}

pub struct Reader {
    editor: DefaultEditor,
}

impl Reader {
    pub fn new(editor: DefaultEditor) -> Self {
        Self { editor }
    }

    pub fn read(&mut self) -> ReadOutput {
        let line = match self.editor.readline(PROMPT) {
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                return ReadOutput::ControlFlow(ControlFlow::Continue(()));
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                return ReadOutput::ControlFlow(ControlFlow::Break(()));
            }
            Err(err) => {
                println!("Error: {}", err);
                return ReadOutput::ControlFlow(ControlFlow::Break(()));
            }
            Ok(line) => line,
        };

        if line.trim().is_empty() {
            return ReadOutput::ControlFlow(ControlFlow::Continue(()));
        }
        if let Err(err) = self.editor.add_history_entry(line.as_str()) {
            tracing::warn!(%err, "cannot record history entry");
        }

        let (program, errors) = parse(&line);
        if errors.is_empty() {
            ReadOutput::Value(program)
        } else {
            print!("{}", RunError::Parse(errors));
            ReadOutput::ControlFlow(ControlFlow::Continue(()))
        }
    }
}
