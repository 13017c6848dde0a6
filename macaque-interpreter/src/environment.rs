use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::object::Object;

#[derive(Default)]
pub struct EnvironmentCore {
    store: FxHashMap<Rc<str>, Rc<Object>>,
    outer: Option<Environment>,
}

/// Shared handle to one scope of the symbol table. Cloning the handle
/// shares the scope.
///
/// A function stored in the scope it closes over forms a reference cycle;
/// such scopes live until the process exits.
#[derive(Clone, Default)]
pub struct Environment {
    core: Rc<RefCell<EnvironmentCore>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_enclosed(outer: &Environment) -> Environment {
        Environment {
            core: Rc::new(RefCell::new(EnvironmentCore {
                store: FxHashMap::default(),
                outer: Some(outer.clone()),
            })),
        }
    }

    /// Looks `name` up in this scope and then in each enclosing one.
    pub fn get(&self, name: &str) -> Option<Rc<Object>> {
        let mut env = self.clone();
        loop {
            let outer = {
                let core = env.core.borrow();
                if let Some(value) = core.store.get(name) {
                    return Some(value.clone());
                }
                core.outer.clone()?
            };
            env = outer;
        }
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn set(&self, name: Rc<str>, value: Rc<Object>) {
        self.core.borrow_mut().store.insert(name, value);
    }

    /// Rebinds `name` in the nearest scope that defines it. Returns false
    /// when no scope does.
    pub fn assign(&self, name: &str, value: Rc<Object>) -> bool {
        let mut env = self.clone();
        loop {
            let outer = {
                let mut core = env.core.borrow_mut();
                if let Some(slot) = core.store.get_mut(name) {
                    *slot = value;
                    return true;
                }
                match core.outer.clone() {
                    Some(outer) => outer,
                    None => return false,
                }
            };
            env = outer;
        }
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.borrow();
        let mut names = core.store.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("enclosed", &core.outer.is_some())
            .finish()
    }
}
