//! Expression language for input signals: tokens, grammar, AST
//!
//! A small closed DSL over the free variable `n`, replacing the general
//! expression evaluation the interactive tool wants for its "input signal"
//! box. Precedence follows the usual conventions (`**` binds tightest and
//! is right-associative, then unary minus, then `* /`, then `+ -`).
//!
//! Builtin names and arities are checked while parsing, so a typo surfaces
//! as a parse error with a byte position instead of failing mid-evaluation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("parse error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("evaluation error: {0}")]
    Eval(String),
}

impl ExpressionError {
    fn parse(position: usize, message: impl Into<String>) -> Self {
        ExpressionError::Parse {
            position,
            message: message.into(),
        }
    }
}

/// The closed set of callable signal functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `d(t)` / `delta(t)` / `impulse(t)` — Kronecker delta
    Impulse,
    /// `u(t)` / `step(t)` — unit step
    Step,
    /// `r(t)` / `ramp(t)` — ramp
    Ramp,
    /// `rect(t, width)` — indicator of `0 <= t < width`
    Rect,
    /// `pt(start, spacing, count)` / `pulse_train(...)` — impulse train
    PulseTrain,
    /// `noise()` — standard normal sample per index
    Noise,
    Sin,
    Cos,
    Tan,
    Exp,
    Sqrt,
    Abs,
    Sign,
    /// `log(t)` — base 10
    Log10,
    /// `ln(t)` — natural
    Ln,
    Sinc,
}

impl Builtin {
    /// Resolve a function name, including the short aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "d" | "delta" | "impulse" => Some(Builtin::Impulse),
            "u" | "step" => Some(Builtin::Step),
            "r" | "ramp" => Some(Builtin::Ramp),
            "rect" => Some(Builtin::Rect),
            "pt" | "pulse_train" => Some(Builtin::PulseTrain),
            "noise" => Some(Builtin::Noise),
            "sin" => Some(Builtin::Sin),
            "cos" => Some(Builtin::Cos),
            "tan" => Some(Builtin::Tan),
            "exp" => Some(Builtin::Exp),
            "sqrt" => Some(Builtin::Sqrt),
            "abs" => Some(Builtin::Abs),
            "sign" => Some(Builtin::Sign),
            "log" => Some(Builtin::Log10),
            "ln" => Some(Builtin::Ln),
            "sinc" => Some(Builtin::Sinc),
            _ => None,
        }
    }

    /// Required argument count
    pub fn arity(self) -> usize {
        match self {
            Builtin::Noise => 0,
            Builtin::Rect => 2,
            Builtin::PulseTrain => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal (also `pi`, folded at parse time)
    Number(f64),
    /// The free variable `n`
    Index,
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Builtin,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    LParen,
    RParen,
    Comma,
}

/// Token plus the byte offset it starts at
type Spanned = (Token, usize);

fn tokenize(source: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let ch = bytes[pos] as char;

        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                pos += 1;
            }
            '+' => {
                tokens.push((Token::Plus, start));
                pos += 1;
            }
            '-' => {
                tokens.push((Token::Minus, start));
                pos += 1;
            }
            '*' => {
                if bytes.get(pos + 1) == Some(&b'*') {
                    tokens.push((Token::DoubleStar, start));
                    pos += 2;
                } else {
                    tokens.push((Token::Star, start));
                    pos += 1;
                }
            }
            '/' => {
                tokens.push((Token::Slash, start));
                pos += 1;
            }
            '(' => {
                tokens.push((Token::LParen, start));
                pos += 1;
            }
            ')' => {
                tokens.push((Token::RParen, start));
                pos += 1;
            }
            ',' => {
                tokens.push((Token::Comma, start));
                pos += 1;
            }
            '0'..='9' | '.' => {
                while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                    pos += 1;
                }
                // Optional exponent part: 1e-3, 2.5E4
                if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
                    let mut lookahead = pos + 1;
                    if matches!(bytes.get(lookahead), Some(&b'+') | Some(&b'-')) {
                        lookahead += 1;
                    }
                    if matches!(bytes.get(lookahead), Some(d) if d.is_ascii_digit()) {
                        pos = lookahead + 1;
                        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    }
                }
                let text = &source[start..pos];
                let value: f64 = text.parse().map_err(|_| {
                    ExpressionError::parse(start, format!("invalid number literal '{text}'"))
                })?;
                tokens.push((Token::Number(value), start));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                tokens.push((Token::Ident(source[start..pos].to_string()), start));
            }
            _ => {
                return Err(ExpressionError::parse(
                    start,
                    format!("unexpected character '{ch}'"),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token stream
struct Parser<'a> {
    tokens: &'a [Spanned],
    cursor: usize,
    source_len: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map(|&(_, p)| p)
            .unwrap_or(self.source_len)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.cursor).map(|(t, _)| t);
        self.cursor += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ExpressionError> {
        let position = self.position();
        match self.advance() {
            Some(t) if *t == expected => Ok(()),
            _ => Err(ExpressionError::parse(position, format!("expected {what}"))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Token::DoubleStar)) {
            self.advance();
            // Right-associative; the exponent may carry its own unary minus
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let position = self.position();
        match self.advance().cloned() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.parse_name(&name, position),
            Some(token) => Err(ExpressionError::parse(
                position,
                format!("unexpected token {token:?}"),
            )),
            None => Err(ExpressionError::parse(position, "unexpected end of input")),
        }
    }

    fn parse_name(&mut self, name: &str, position: usize) -> Result<Expr, ExpressionError> {
        let is_call = matches!(self.peek(), Some(Token::LParen));

        if !is_call {
            return match name {
                "n" => Ok(Expr::Index),
                "pi" => Ok(Expr::Number(std::f64::consts::PI)),
                _ => Err(ExpressionError::parse(
                    position,
                    format!("unknown identifier '{name}'"),
                )),
            };
        }

        let function = Builtin::from_name(name).ok_or_else(|| {
            ExpressionError::parse(position, format!("unknown function '{name}'"))
        })?;

        self.advance(); // consume '('
        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                args.push(self.parse_expr()?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;

        if args.len() != function.arity() {
            return Err(ExpressionError::parse(
                position,
                format!(
                    "'{name}' takes {} argument(s), got {}",
                    function.arity(),
                    args.len()
                ),
            ));
        }

        Ok(Expr::Call { function, args })
    }
}

/// Parse a source string into an expression tree
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        source_len: source.len(),
    };

    let expr = parser.parse_expr()?;
    if parser.cursor < tokens.len() {
        return Err(ExpressionError::parse(
            parser.position(),
            "trailing input after expression",
        ));
    }
    Ok(expr)
}
