use std::cell::RefCell;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use macaque_core::ast;
use macaque_core::stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;

use crate::context::Context;
use crate::environment::Environment;

#[derive(Debug, PartialEq)]
pub enum Object {
    Number(f64),
    Boolean(bool),
    String(Rc<str>),
    Null,
    Array(RefCell<Vec<Rc<Object>>>),
    Hash(RefCell<HashObject>),
    Function(Function),
    Builtin(Builtin),
    Macro(Macro),
    Quote(ast::Expression),
}

thread_local! {
    static NULL: Rc<Object> = Rc::new(Object::Null);
    static TRUE: Rc<Object> = Rc::new(Object::Boolean(true));
    static FALSE: Rc<Object> = Rc::new(Object::Boolean(false));
}

impl Object {
    pub fn null() -> Rc<Object> {
        NULL.with(|x| x.clone())
    }
    pub fn boolean(value: bool) -> Rc<Object> {
        if value {
            TRUE.with(|x| x.clone())
        } else {
            FALSE.with(|x| x.clone())
        }
    }
    pub fn number(value: f64) -> Rc<Object> {
        Rc::new(Object::Number(value))
    }
    pub fn string(value: impl Into<Rc<str>>) -> Rc<Object> {
        Rc::new(Object::String(value.into()))
    }
    pub fn array(elements: Vec<Rc<Object>>) -> Rc<Object> {
        Rc::new(Object::Array(RefCell::new(elements)))
    }
    pub fn hash(hash: HashObject) -> Rc<Object> {
        Rc::new(Object::Hash(RefCell::new(hash)))
    }
    pub fn function(literal: Rc<ast::FunctionLiteral>, closure: Environment) -> Rc<Object> {
        Rc::new(Object::Function(Function { literal, closure }))
    }
    pub fn quote(expression: ast::Expression) -> Rc<Object> {
        Rc::new(Object::Quote(expression))
    }

    pub fn kind(&self) -> ObjectType {
        match self {
            Object::Number(_) => ObjectType::Number,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::String(_) => ObjectType::String,
            Object::Null => ObjectType::Null,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Macro(_) => ObjectType::Macro,
            Object::Quote(_) => ObjectType::Quote,
        }
    }

    /// Key under which the object is stored in a hash. Only numbers,
    /// booleans and strings are hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        let hash = match self {
            // 0.0 and -0.0 compare equal so they must share a key
            Object::Number(value) if *value == 0.0 => 0,
            Object::Number(value) => value.to_bits(),
            Object::Boolean(value) => u64::from(*value),
            Object::String(value) => {
                let mut hasher = FxHasher::default();
                value.hash(&mut hasher);
                hasher.finish()
            }
            _ => return None,
        };
        Some(HashKey {
            kind: self.kind(),
            hash,
        })
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Boolean(value) => *value,
            Object::Null => false,
            Object::Number(value) => *value != 0.0,
            Object::String(value) => !value.is_empty(),
            Object::Array(elements) => !elements.borrow().is_empty(),
            Object::Hash(hash) => !hash.borrow().is_empty(),
            _ => true,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ObjectType {
    Number,
    Boolean,
    String,
    Null,
    Array,
    Hash,
    Function,
    Builtin,
    Macro,
    Quote,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectType::Number => "NUMBER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::String => "STRING",
            ObjectType::Null => "NULL",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Macro => "MACRO",
            ObjectType::Quote => "QUOTE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct HashKey {
    pub kind: ObjectType,
    pub hash: u64,
}

#[derive(Debug, PartialEq, Clone)]
pub struct HashPair {
    pub key: Rc<Object>,
    pub value: Rc<Object>,
}

/// Hash contents in insertion order. Re-inserting a key keeps its original
/// position.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct HashObject {
    positions: FxHashMap<HashKey, usize>,
    pairs: Vec<HashPair>,
}

impl HashObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: HashKey, pair: HashPair) {
        match self.positions.get(&key) {
            Some(&position) => self.pairs[position] = pair,
            None => {
                self.positions.insert(key, self.pairs.len());
                self.pairs.push(pair);
            }
        }
    }

    pub fn get(&self, key: &HashKey) -> Option<&HashPair> {
        self.positions.get(key).map(|&position| &self.pairs[position])
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HashPair> {
        self.pairs.iter()
    }
}

#[derive(Clone)]
pub struct Function {
    pub literal: Rc<ast::FunctionLiteral>,
    pub closure: Environment,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.literal, &other.literal) && self.closure.ptr_eq(&other.closure)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("literal", &self.literal.to_string())
            .finish()
    }
}

#[derive(Clone)]
pub struct Macro {
    pub name: Rc<str>,
    pub parameters: Vec<ast::Identifier>,
    pub body: ast::BlockStatement,
    pub environment: Environment,
}

impl PartialEq for Macro {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.body == other.body
            && self.environment.ptr_eq(&other.environment)
    }
}

impl std::fmt::Debug for Macro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Macro").field("name", &self.name).finish()
    }
}

pub type BuiltinFn =
    fn(&mut Context, &Environment, Vec<Rc<Object>>) -> Result<Rc<Object>, Interruption>;

/// Native callables. Functions receive evaluated arguments; macros receive
/// each argument wrapped, unevaluated, in a `Quote`.
#[derive(Clone, Copy)]
pub enum BuiltinKind {
    Function(BuiltinFn),
    Macro(BuiltinFn),
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

fn write_separated<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> std::fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inspect(f, &mut Vec::new())
    }
}

impl Object {
    /// Writes the Inspect form. `open` holds the containers currently being
    /// written, so a container that holds itself prints as `[...]` or
    /// `{...}` the second time around.
    fn inspect(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        open: &mut Vec<*const Object>,
    ) -> std::fmt::Result {
        let this = self as *const Object;
        match self {
            Object::Number(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::String(value) => write!(f, "\"{}\"", value),
            Object::Null => write!(f, "null"),
            Object::Array(_) if open.contains(&this) => write!(f, "[...]"),
            Object::Hash(_) if open.contains(&this) => write!(f, "{{...}}"),
            Object::Array(elements) => ensure_sufficient_stack(|| {
                open.push(this);
                write!(f, "[")?;
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    element.inspect(f, open)?;
                }
                open.pop();
                write!(f, "]")
            }),
            Object::Hash(hash) => ensure_sufficient_stack(|| {
                open.push(this);
                write!(f, "{{")?;
                for (i, pair) in hash.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    pair.key.inspect(f, open)?;
                    write!(f, ": ")?;
                    pair.value.inspect(f, open)?;
                }
                open.pop();
                write!(f, "}}")
            }),
            Object::Function(function) => {
                write!(f, "<fn (")?;
                write_separated(f, &function.literal.parameters)?;
                write!(f, ")>")
            }
            Object::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Object::Macro(macro_object) => {
                write!(f, "<macro {}(", macro_object.name)?;
                write_separated(f, &macro_object.parameters)?;
                write!(f, ")>")
            }
            Object::Quote(expression) => write!(f, "QUOTE({})", expression),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Interruption {
    Return(Rc<Object>),
    Error(EvaluationError),
}

impl From<EvaluationError> for Interruption {
    fn from(value: EvaluationError) -> Self {
        Interruption::Error(value)
    }
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum EvaluationError {
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },
    #[error("unknown operator: {operator}{right}")]
    UnknownPrefixOperator {
        operator: &'static str,
        right: ObjectType,
    },
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        left: ObjectType,
        operator: &'static str,
        right: ObjectType,
    },
    #[error("unknown operator: {base}[{subscript}]")]
    UnknownSubscriptOperator {
        base: ObjectType,
        subscript: ObjectType,
    },
    #[error("unknown operator: {0}()")]
    NotCallable(ObjectType),
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(Rc<str>),
    #[error("unexpected lvalue type <{0}>")]
    InvalidAssignmentTarget(&'static str),
    #[error("subscript value must be a positive whole number: {0}")]
    InvalidSubscript(f64),
    #[error("array index {index} exceeds the maximum array length {limit}")]
    ArrayTooLarge { index: f64, limit: usize },
    #[error("macro `{0}` can only be defined at the top level")]
    MisplacedMacro(Rc<str>),
    #[error("argument(s) to `{name}` not supported: ({})", join_types(.arguments))]
    UnsupportedArguments {
        name: &'static str,
        arguments: Vec<ObjectType>,
    },
    #[error("wrong number of arguments: expected {expected}, got {actual}")]
    WrongArgumentCount { expected: usize, actual: usize },
    #[error("maximum call depth exceeded: {0}")]
    CallDepthExceeded(usize),
    #[error("`unquote` can only be invoked during quoting")]
    UnquoteOutsideQuote,
    #[error("cannot write output: {0}")]
    Output(String),
    #[error("{0}")]
    Rewrite(Rc<str>),
}

fn join_types(types: &[ObjectType]) -> String {
    types
        .iter()
        .map(|kind| kind.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl EvaluationError {
    pub fn unsupported_arguments(name: &'static str, arguments: &[Rc<Object>]) -> Self {
        EvaluationError::UnsupportedArguments {
            name,
            arguments: arguments.iter().map(|argument| argument.kind()).collect(),
        }
    }
}
