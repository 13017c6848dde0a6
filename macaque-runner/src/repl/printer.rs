use std::rc::Rc;

use macaque_interpreter::{EvaluationError, Object};

pub struct Printer {}

impl Printer {
    pub fn print(&mut self, result: Result<Rc<Object>, EvaluationError>) {
        match result {
            Ok(object) if matches!(object.as_ref(), Object::Null) => {}
            Ok(object) => println!("{}", object),
            Err(err) => println!("Error evaluating:\n\t{}", err),
        }
    }
}
