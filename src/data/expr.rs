//! Field expression evaluation against the variable table.
//!
//! The graph builder only sees the narrow [`Evaluator`] trait. [`ExprEvaluator`]
//! is the default implementation: a small arithmetic language over message
//! attributes (`ATT.Roll * 2`, `GPS[1].Alt - GPS[0].Alt`, `degrees(atan2(MAG.MagY, MAG.MagX))`).

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::data::record::{Record, Value, VarEntry, VarTable};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("syntax error at offset {pos}: {msg}")]
    Syntax { pos: usize, msg: String },
    #[error("name '{0}' is not defined")]
    Undefined(String),
    #[error("'{target}' has no attribute '{attr}'")]
    NoAttribute { target: String, attr: String },
    #[error("{0}")]
    Type(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
}

/// Evaluate an expression string against the current variable table.
///
/// `Ok(None)` means the expression is valid but does not denote a plottable
/// value (for example it names a whole message rather than one attribute).
pub trait Evaluator {
    fn evaluate(&self, expr: &str, vars: &VarTable) -> Result<Option<Value>, ExprError>;

    /// A condition passes only when it evaluates to a truthy value.
    fn evaluate_condition(&self, condition: &str, vars: &VarTable) -> bool {
        matches!(self.evaluate(condition, vars), Ok(Some(v)) if v.truthy())
    }
}

/// Default expression language with a per-instance parse cache.
#[derive(Default)]
pub struct ExprEvaluator {
    cache: RefCell<HashMap<String, Rc<Expr>>>,
}

impl ExprEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, src: &str) -> Result<Rc<Expr>, ExprError> {
        if let Some(e) = self.cache.borrow().get(src) {
            return Ok(e.clone());
        }
        let e = Rc::new(parse(src)?);
        self.cache.borrow_mut().insert(src.to_string(), e.clone());
        Ok(e)
    }
}

impl Evaluator for ExprEvaluator {
    fn evaluate(&self, expr: &str, vars: &VarTable) -> Result<Option<Value>, ExprError> {
        let compiled = self.compiled(expr)?;
        match eval(&compiled, vars)? {
            Operand::Val(v) => Ok(Some(v)),
            Operand::Rec(_) | Operand::Inst(..) => Ok(None),
        }
    }
}

/// Check that `src` parses, without evaluating it.
pub fn check_syntax(src: &str) -> Result<(), ExprError> {
    parse(src).map(|_| ())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Str(String),
    Ident(String),
    Sym(&'static str),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    pos: usize,
}

const SYMBOLS: [&str; 21] = [
    "**", "==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "(", ")", "[", "]", ",",
    ".", "<", ">", "!",
];

fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                i += 1;
            }
            if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
                let mut j = i + 1;
                if j < chars.len() && matches!(chars[j].1, '+' | '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].1.is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let end = chars.get(i).map(|&(p, _)| p).unwrap_or(src.len());
            let text = &src[chars[start].0..end];
            let v: f64 = text.parse().map_err(|_| ExprError::Syntax {
                pos,
                msg: format!("bad number '{text}'"),
            })?;
            out.push(Token { tok: Tok::Num(v), pos });
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let end = chars.get(i).map(|&(p, _)| p).unwrap_or(src.len());
            out.push(Token {
                tok: Tok::Ident(src[chars[start].0..end].to_string()),
                pos,
            });
        } else if c == '"' || c == '\'' {
            let quote = c;
            let mut s = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(ExprError::Syntax {
                            pos,
                            msg: "unterminated string".into(),
                        })
                    }
                    Some(&(_, ch)) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some(&(_, '\\')) => {
                        if let Some(&(_, esc)) = chars.get(i + 1) {
                            s.push(esc);
                        }
                        i += 2;
                    }
                    Some(&(_, ch)) => {
                        s.push(ch);
                        i += 1;
                    }
                }
            }
            out.push(Token { tok: Tok::Str(s), pos });
        } else if let Some(sym) = SYMBOLS.iter().find(|s| src[pos..].starts_with(**s)) {
            i += sym.len();
            out.push(Token { tok: Tok::Sym(*sym), pos });
        } else {
            return Err(ExprError::Syntax {
                pos,
                msg: format!("unexpected character '{c}'"),
            });
        }
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Num(f64),
    Str(String),
    Bool(bool),
    Name(String),
    Attr(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

const KEYWORDS: [&str; 3] = ["and", "or", "not"];

fn parse(src: &str) -> Result<Expr, ExprError> {
    let toks = tokenize(src)?;
    let mut p = Parser {
        toks: &toks,
        pos: 0,
        src_len: src.len(),
    };
    let e = p.or()?;
    if p.pos < toks.len() {
        return Err(p.error("unexpected trailing input"));
    }
    Ok(e)
}

struct Parser<'a> {
    toks: &'a [Token],
    pos: usize,
    src_len: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> ExprError {
        ExprError::Syntax {
            pos: self.toks.get(self.pos).map(|t| t.pos).unwrap_or(self.src_len),
            msg: msg.to_string(),
        }
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|t| &t.tok)
    }

    fn eat_sym(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Sym(s)) if *s == sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Ident(s)) if s == kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_sym(&mut self, sym: &str) -> Result<(), ExprError> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{sym}'")))
        }
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut l = self.and()?;
        while self.eat_sym("||") || self.eat_keyword("or") {
            let r = self.and()?;
            l = Expr::Bin(BinOp::Or, Box::new(l), Box::new(r));
        }
        Ok(l)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut l = self.not()?;
        while self.eat_sym("&&") || self.eat_keyword("and") {
            let r = self.not()?;
            l = Expr::Bin(BinOp::And, Box::new(l), Box::new(r));
        }
        Ok(l)
    }

    fn not(&mut self) -> Result<Expr, ExprError> {
        if self.eat_sym("!") || self.eat_keyword("not") {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let mut l = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Sym("==")) => BinOp::Eq,
                Some(Tok::Sym("!=")) => BinOp::Ne,
                Some(Tok::Sym("<=")) => BinOp::Le,
                Some(Tok::Sym(">=")) => BinOp::Ge,
                Some(Tok::Sym("<")) => BinOp::Lt,
                Some(Tok::Sym(">")) => BinOp::Gt,
                _ => return Ok(l),
            };
            self.pos += 1;
            let r = self.additive()?;
            l = Expr::Bin(op, Box::new(l), Box::new(r));
        }
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut l = self.multiplicative()?;
        loop {
            let op = if self.eat_sym("+") {
                BinOp::Add
            } else if self.eat_sym("-") {
                BinOp::Sub
            } else {
                return Ok(l);
            };
            let r = self.multiplicative()?;
            l = Expr::Bin(op, Box::new(l), Box::new(r));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut l = self.unary()?;
        loop {
            let op = if self.eat_sym("*") {
                BinOp::Mul
            } else if self.eat_sym("/") {
                BinOp::Div
            } else if self.eat_sym("%") {
                BinOp::Rem
            } else {
                return Ok(l);
            };
            let r = self.unary()?;
            l = Expr::Bin(op, Box::new(l), Box::new(r));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat_sym("-") {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat_sym("+") {
            return self.unary();
        }
        self.power()
    }

    // `**` binds tighter than a unary minus on its left and is right-associative.
    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.postfix()?;
        if self.eat_sym("**") {
            let exp = self.unary()?;
            return Ok(Expr::Bin(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.primary()?;
        loop {
            if self.eat_sym(".") {
                match self.peek().cloned() {
                    Some(Tok::Ident(name)) => {
                        self.pos += 1;
                        e = Expr::Attr(Box::new(e), name);
                    }
                    _ => return Err(self.error("expected attribute name")),
                }
            } else if self.eat_sym("[") {
                let idx = self.or()?;
                self.expect_sym("]")?;
                e = Expr::Index(Box::new(e), Box::new(idx));
            } else if matches!(e, Expr::Name(_)) && self.eat_sym("(") {
                let mut args = Vec::new();
                if !self.eat_sym(")") {
                    loop {
                        args.push(self.or()?);
                        if self.eat_sym(")") {
                            break;
                        }
                        self.expect_sym(",")?;
                    }
                }
                let Expr::Name(name) = e else { unreachable!() };
                e = Expr::Call(name, args);
            } else {
                return Ok(e);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().cloned() {
            Some(Tok::Num(v)) => {
                self.pos += 1;
                Ok(Expr::Num(v))
            }
            Some(Tok::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s))
            }
            Some(Tok::Ident(name)) if !KEYWORDS.contains(&name.as_str()) => {
                self.pos += 1;
                Ok(match name.as_str() {
                    "True" | "true" => Expr::Bool(true),
                    "False" | "false" => Expr::Bool(false),
                    _ => Expr::Name(name),
                })
            }
            Some(Tok::Sym("(")) => {
                self.pos += 1;
                let e = self.or()?;
                self.expect_sym(")")?;
                Ok(e)
            }
            _ => Err(self.error("expected a value")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

enum Operand<'v> {
    Val(Value),
    Rec(&'v Record),
    Inst(&'v BTreeMap<String, Record>, String),
}

fn type_error(msg: impl Into<String>) -> ExprError {
    ExprError::Type(msg.into())
}

fn eval<'v>(e: &Expr, vars: &'v VarTable) -> Result<Operand<'v>, ExprError> {
    Ok(match e {
        Expr::Num(v) => Operand::Val(Value::Number(*v)),
        Expr::Str(s) => Operand::Val(Value::Text(s.clone())),
        Expr::Bool(b) => Operand::Val(Value::Bool(*b)),
        Expr::Name(name) => match vars.get(name) {
            Some(VarEntry::Latest(r)) => Operand::Rec(r),
            Some(VarEntry::Instances(m)) => Operand::Inst(m, name.clone()),
            None => match name.as_str() {
                "pi" => Operand::Val(Value::Number(std::f64::consts::PI)),
                "e" => Operand::Val(Value::Number(std::f64::consts::E)),
                _ => return Err(ExprError::Undefined(name.clone())),
            },
        },
        Expr::Attr(target, attr) => {
            let target_name = match eval(target, vars)? {
                Operand::Rec(r) => {
                    return r.get(attr).cloned().map(Operand::Val).ok_or_else(|| {
                        ExprError::NoAttribute {
                            target: r.msg_type.clone(),
                            attr: attr.clone(),
                        }
                    })
                }
                Operand::Inst(_, name) => name,
                Operand::Val(_) => "value".to_string(),
            };
            return Err(ExprError::NoAttribute {
                target: target_name,
                attr: attr.clone(),
            });
        }
        Expr::Index(target, idx) => {
            let key = eval_value(idx, vars)?;
            match eval(target, vars)? {
                Operand::Inst(m, name) => {
                    let k = key.key_string();
                    match m.get(&k) {
                        Some(r) => Operand::Rec(r),
                        None => return Err(ExprError::Undefined(format!("{name}[{k}]"))),
                    }
                }
                Operand::Val(Value::Array(items)) => {
                    let i = key
                        .as_f64()
                        .filter(|i| i.fract() == 0.0)
                        .ok_or_else(|| type_error("array index must be an integer"))?
                        as i64;
                    let i = if i < 0 { items.len() as i64 + i } else { i };
                    match usize::try_from(i).ok().and_then(|i| items.get(i)) {
                        Some(v) => Operand::Val(v.clone()),
                        None => return Err(type_error("array index out of range")),
                    }
                }
                Operand::Rec(r) => {
                    return Err(type_error(format!("'{}' has no instances", r.msg_type)))
                }
                Operand::Val(_) => return Err(type_error("value is not indexable")),
            }
        }
        Expr::Neg(inner) => {
            let v = eval_value(inner, vars)?;
            Operand::Val(Value::Number(-num(&v)?))
        }
        Expr::Not(inner) => Operand::Val(Value::Bool(!eval_value(inner, vars)?.truthy())),
        Expr::Bin(BinOp::And, l, r) => {
            let lv = eval_value(l, vars)?;
            if !lv.truthy() {
                Operand::Val(lv)
            } else {
                Operand::Val(eval_value(r, vars)?)
            }
        }
        Expr::Bin(BinOp::Or, l, r) => {
            let lv = eval_value(l, vars)?;
            if lv.truthy() {
                Operand::Val(lv)
            } else {
                Operand::Val(eval_value(r, vars)?)
            }
        }
        Expr::Bin(op, l, r) => {
            let lv = eval_value(l, vars)?;
            let rv = eval_value(r, vars)?;
            Operand::Val(binary(*op, lv, rv)?)
        }
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|a| eval_value(a, vars))
                .collect::<Result<Vec<_>, _>>()?;
            Operand::Val(call(name, values)?)
        }
    })
}

fn eval_value(e: &Expr, vars: &VarTable) -> Result<Value, ExprError> {
    match eval(e, vars)? {
        Operand::Val(v) => Ok(v),
        Operand::Rec(r) => Err(type_error(format!("'{}' is a message, not a value", r.msg_type))),
        Operand::Inst(_, name) => Err(type_error(format!("'{name}' needs an instance index"))),
    }
}

fn num(v: &Value) -> Result<f64, ExprError> {
    v.as_f64()
        .ok_or_else(|| type_error(format!("expected a number, got '{v}'")))
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, ExprError> {
    use std::cmp::Ordering;

    let ordering = |l: &Value, r: &Value| -> Result<Ordering, ExprError> {
        match (l, r) {
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            _ => num(l)?
                .partial_cmp(&num(r)?)
                .ok_or_else(|| type_error("comparison with NaN")),
        }
    };
    let equal = |l: &Value, r: &Value| match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => l == r,
    };

    Ok(match op {
        BinOp::Add => match (&l, &r) {
            (Value::Text(a), Value::Text(b)) => Value::Text(format!("{a}{b}")),
            _ => Value::Number(num(&l)? + num(&r)?),
        },
        BinOp::Sub => Value::Number(num(&l)? - num(&r)?),
        BinOp::Mul => Value::Number(num(&l)? * num(&r)?),
        BinOp::Div => {
            let d = num(&r)?;
            if d == 0.0 {
                return Err(type_error("division by zero"));
            }
            Value::Number(num(&l)? / d)
        }
        BinOp::Rem => {
            let (a, b) = (num(&l)?, num(&r)?);
            if b == 0.0 {
                return Err(type_error("modulo by zero"));
            }
            // Result takes the sign of the divisor.
            Value::Number(a - b * (a / b).floor())
        }
        BinOp::Pow => Value::Number(num(&l)?.powf(num(&r)?)),
        BinOp::Eq => Value::Bool(equal(&l, &r)),
        BinOp::Ne => Value::Bool(!equal(&l, &r)),
        BinOp::Lt => Value::Bool(ordering(&l, &r)? == Ordering::Less),
        BinOp::Le => Value::Bool(ordering(&l, &r)? != Ordering::Greater),
        BinOp::Gt => Value::Bool(ordering(&l, &r)? == Ordering::Greater),
        BinOp::Ge => Value::Bool(ordering(&l, &r)? != Ordering::Less),
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators are handled in eval"),
    })
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, ExprError> {
    let arity = |n: usize| -> Result<Vec<f64>, ExprError> {
        if args.len() != n {
            return Err(type_error(format!(
                "{name}() takes {n} argument(s), {} given",
                args.len()
            )));
        }
        args.iter().map(num).collect()
    };

    let out = match name {
        "len" => match args.as_slice() {
            [Value::Array(a)] => a.len() as f64,
            [Value::Text(s)] => s.chars().count() as f64,
            _ => return Err(type_error("len() takes one array or string")),
        },
        "min" | "max" => {
            let flat: Vec<f64> = match args.as_slice() {
                [Value::Array(a)] => a.iter().map(num).collect::<Result<_, _>>()?,
                _ => args.iter().map(num).collect::<Result<_, _>>()?,
            };
            let pick: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            flat.into_iter()
                .reduce(pick)
                .ok_or_else(|| type_error(format!("{name}() of empty sequence")))?
        }
        "round" if args.len() == 2 => {
            let a = arity(2)?;
            let scale = 10f64.powi(a[1] as i32);
            (a[0] * scale).round() / scale
        }
        "log" if args.len() == 2 => {
            let a = arity(2)?;
            a[0].ln() / a[1].ln()
        }
        "atan2" | "pow" | "hypot" | "fmod" => {
            let a = arity(2)?;
            match name {
                "atan2" => a[0].atan2(a[1]),
                "pow" => a[0].powf(a[1]),
                "hypot" => a[0].hypot(a[1]),
                _ => a[0] % a[1],
            }
        }
        _ => {
            let f: fn(f64) -> f64 = match name {
                "sin" => f64::sin,
                "cos" => f64::cos,
                "tan" => f64::tan,
                "asin" => f64::asin,
                "acos" => f64::acos,
                "atan" => f64::atan,
                "sqrt" => f64::sqrt,
                "abs" | "fabs" => f64::abs,
                "degrees" => f64::to_degrees,
                "radians" => f64::to_radians,
                "floor" => f64::floor,
                "ceil" => f64::ceil,
                "round" => f64::round,
                "int" => f64::trunc,
                "float" => |v| v,
                "log" => f64::ln,
                "log10" => f64::log10,
                "exp" => f64::exp,
                _ => return Err(ExprError::UnknownFunction(name.to_string())),
            };
            f(arity(1)?[0])
        }
    };
    if out.is_nan() && !args.iter().any(|a| a.as_f64().is_some_and(f64::is_nan)) {
        return Err(type_error(format!("math domain error in {name}()")));
    }
    Ok(Value::Number(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> VarTable {
        let mut v = VarTable::new();
        v.insert_latest(&Record::new("ATT", 1.0).with("Roll", 10.0).with("Pitch", -2.0));
        v.insert_latest(&Record::new("MSG", 1.0).with("Message", "armed"));
        let gps0 = Record::new("GPS", 1.0).with("I", 0.0).with("Alt", 100.0);
        let gps1 = Record::new("GPS", 1.0).with("I", 1.0).with("Alt", 104.0);
        v.insert_instance("0".into(), &gps0);
        v.insert_instance("1".into(), &gps1);
        v
    }

    #[test]
    fn syntax_check_without_data() {
        assert!(check_syntax("ATT.Roll > 0 && GPS[1].Alt < 200").is_ok());
        assert!(matches!(check_syntax("ATT.Roll +"), Err(ExprError::Syntax { .. })));
        assert!(matches!(check_syntax("1 2"), Err(ExprError::Syntax { .. })));
    }

    fn eval_num(src: &str) -> f64 {
        ExprEvaluator::new()
            .evaluate(src, &vars())
            .unwrap()
            .and_then(|v| v.as_f64())
            .unwrap()
    }

    #[test]
    fn precedence_and_power() {
        assert_eq!(eval_num("1 + 2 * 3"), 7.0);
        assert_eq!(eval_num("-2 ** 2"), -4.0);
        assert_eq!(eval_num("2 ** 3 ** 2"), 512.0);
        assert_eq!(eval_num("(1 + 2) * 3"), 9.0);
        assert_eq!(eval_num("-7 % 3"), 2.0);
    }

    #[test]
    fn attributes_and_instances() {
        assert_eq!(eval_num("ATT.Roll * 2"), 20.0);
        assert_eq!(eval_num("GPS[1].Alt - GPS[0].Alt"), 4.0);
        assert!((eval_num("degrees(atan2(1, 1))") - 45.0).abs() < 1e-9);
        assert_eq!(eval_num("max(ATT.Roll, ATT.Pitch, 3)"), 10.0);
    }

    #[test]
    fn errors_are_reported_not_panicked() {
        let ev = ExprEvaluator::new();
        let v = vars();
        assert_eq!(
            ev.evaluate("BARO.Alt", &v),
            Err(ExprError::Undefined("BARO".into()))
        );
        assert!(matches!(
            ev.evaluate("ATT.Yaw", &v),
            Err(ExprError::NoAttribute { .. })
        ));
        assert!(matches!(ev.evaluate("ATT.Roll +", &v), Err(ExprError::Syntax { .. })));
        assert!(matches!(ev.evaluate("sqrt(-1)", &v), Err(ExprError::Type(_))));
        assert!(matches!(ev.evaluate("1/0", &v), Err(ExprError::Type(_))));
    }

    #[test]
    fn whole_message_is_not_a_value() {
        assert_eq!(ExprEvaluator::new().evaluate("ATT", &vars()), Ok(None));
    }

    #[test]
    fn conditions() {
        let ev = ExprEvaluator::new();
        let v = vars();
        assert!(ev.evaluate_condition("ATT.Roll > 5 and ATT.Pitch < 0", &v));
        assert!(!ev.evaluate_condition("ATT.Roll > 50", &v));
        assert!(ev.evaluate_condition("MSG.Message == 'armed'", &v));
        // Undefined names reject rather than error out.
        assert!(!ev.evaluate_condition("NOPE.x > 0", &v));
    }
}
