//! Parser for HCL source.
//!
//! Transforms a token stream from the lexer into [`Body`] and [`Expression`]
//! trees. Uses chumsky for parser combinators.
//!
//! The whole native-syntax expression grammar is accepted, so any module
//! parses; deciding what an expression means is left to the evaluator and
//! the constraint builder.

use crate::ast::{
    Attribute, BinaryOp, Block, Body, ExprKind, Expression, ForExpr, Literal, ObjectItem,
    ObjectKey,
};
use crate::lexer::{self, Text, Token};
use chumsky::{input::ValueInput, prelude::*};

type Span = SimpleSpan;
type Extra<'tokens> = extra::Err<Rich<'tokens, Token, Span>>;

/// Parse error with location and context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {span}")]
pub struct ParseError {
    pub span: crate::ast::Span,
    pub message: String,
}

enum BodyItem {
    Attribute(Attribute),
    Block(Block),
}

/// A postfix step applied to an expression.
#[derive(Clone)]
enum Step {
    Attr(String),
    Index(Expression),
    Splat,
}

/// Parse a whole file (or any body) of HCL.
///
/// An attribute set twice in the same body is an error.
pub fn parse_body(source: &str) -> Result<Body, Vec<ParseError>> {
    let tokens = lex(source)?;
    let end_span: Span = (source.len()..source.len()).into();

    let parser = body_parser().then_ignore(end());
    let body = parser
        .parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)))
        .into_result()
        .map_err(rich_errors)?;

    let mut errors = Vec::new();
    redefined_attributes(&body, &mut errors);
    if errors.is_empty() {
        Ok(body)
    } else {
        Err(errors)
    }
}

/// Parse a single expression, e.g. the text of a type constraint.
///
/// Leading and trailing newlines are allowed.
pub fn parse_expression(source: &str) -> Result<Expression, Vec<ParseError>> {
    let tokens = lex(source)?;
    let end_span: Span = (source.len()..source.len()).into();

    let parser = newlines()
        .ignore_then(expr_parser())
        .then_ignore(newlines())
        .then_ignore(end());
    let result = parser.parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));

    result.into_result().map_err(rich_errors)
}

fn lex(source: &str) -> Result<Vec<(Token, Span)>, Vec<ParseError>> {
    let tokens = lexer::tokenize(source).map_err(|errs| {
        errs.into_iter()
            .map(|e| ParseError {
                span: e.span.clone().into(),
                message: format!("lexer error: unexpected {:?}", e.text),
            })
            .collect::<Vec<_>>()
    })?;

    Ok(tokens
        .into_iter()
        .map(|spanned| (spanned.token, (spanned.span.start..spanned.span.end).into()))
        .collect())
}

fn rich_errors(errs: Vec<Rich<'_, Token, Span>>) -> Vec<ParseError> {
    errs.into_iter()
        .map(|e| ParseError {
            span: (*e.span()).into(),
            message: e.to_string(),
        })
        .collect()
}

fn redefined_attributes(body: &Body, errors: &mut Vec<ParseError>) {
    for (i, attr) in body.attributes.iter().enumerate() {
        if let Some(first) = body.attributes[..i].iter().find(|a| a.name == attr.name) {
            errors.push(ParseError {
                span: attr.span,
                message: format!(
                    "attribute {:?} redefined, first set at {}",
                    attr.name, first.span
                ),
            });
        }
    }
    for block in &body.blocks {
        redefined_attributes(&block.body, errors);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// Body parser: attributes and blocks, each ended by newlines.
fn body_parser<'tokens, I>() -> impl Parser<'tokens, I, Body, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|body| {
        let attribute = ident_parser()
            .then_ignore(just(Token::Eq))
            .then(expr_parser())
            .map_with(|(name, expr), e| Attribute {
                name,
                expr,
                span: <Span as Into<crate::ast::Span>>::into(e.span()),
            })
            .labelled("attribute");

        let label = select! {
            Token::String(Text::Literal(s)) => s,
            Token::Ident(s) => s,
        }
        .labelled("block label");

        let header = ident_parser()
            .then(label.repeated().collect::<Vec<_>>())
            .map_with(|(kind, labels), e| -> (String, Vec<String>, Span) { (kind, labels, e.span()) });

        let block = header
            .then_ignore(just(Token::LBrace))
            .then(body)
            .then_ignore(just(Token::RBrace))
            .map_with(|((kind, labels, def_span), body), e| Block {
                kind,
                labels,
                body,
                def_span: def_span.into(),
                span: <Span as Into<crate::ast::Span>>::into(e.span()),
            })
            .labelled("block");

        let item = choice((
            attribute.map(BodyItem::Attribute),
            block.map(BodyItem::Block),
        ))
        .then_ignore(newlines());

        newlines()
            .ignore_then(item.repeated().collect::<Vec<_>>())
            .map(|items| {
                let mut body = Body::default();
                for item in items {
                    match item {
                        BodyItem::Attribute(attr) => body.attributes.push(attr),
                        BodyItem::Block(block) => body.blocks.push(block),
                    }
                }
                body
            })
    })
    .boxed()
}

/// Zero or more newline tokens.
fn newlines<'tokens, I>() -> impl Parser<'tokens, I, (), Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    just(Token::Newline).repeated()
}

fn ident_parser<'tokens, I>() -> impl Parser<'tokens, I, String, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(s) => s,
    }
    .labelled("identifier")
}

/// An identifier with special meaning in one position, like `for` or `in`.
fn keyword<'tokens, I>(name: &'static str) -> impl Parser<'tokens, I, (), Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    just(Token::Ident(name.to_string())).ignored().labelled(name)
}

/// One left-associative precedence level: `operand { op operand }`.
fn binary<'tokens, I, P, O>(
    operand: P,
    op: O,
) -> impl Parser<'tokens, I, Expression, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
    P: Parser<'tokens, I, Expression, Extra<'tokens>> + Clone,
    O: Parser<'tokens, I, BinaryOp, Extra<'tokens>> + Clone,
{
    operand
        .clone()
        .foldl(op.then(operand).repeated(), |lhs, (op, rhs)| {
            let span = lhs.span.to(rhs.span);
            Expression::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            )
        })
}

/// Expression parser.
///
/// Grammar, lowest precedence first:
///   expr      = or [ "?" expr ":" expr ]
///   or        = and { "||" and }
///   and       = equality { "&&" equality }
///   equality  = compare { ("==" | "!=") compare }
///   compare   = sum { ("<" | ">" | "<=" | ">=") sum }
///   sum       = product { ("+" | "-") product }
///   product   = unary { ("*" | "/" | "%") unary }
///   unary     = ("-" | "!") unary | postfix
///   postfix   = primary { "." IDENT | "." NUMBER | "[" expr "]" | ".*" | "[*]" }
///   primary   = literal | template | heredoc | call | traversal
///             | for_tuple | tuple | for_object | object | "(" expr ")"
///   call      = IDENT { "::" IDENT } "(" [ expr { "," expr } [","] ["..."] ] ")"
///   traversal = IDENT { "." IDENT }
///   for_tuple = "[" for_intro expr [ "if" expr ] "]"
///   for_object = "{" for_intro expr "=>" expr ["..."] [ "if" expr ] "}"
///   for_intro = "for" IDENT [ "," IDENT ] "in" expr ":"
///   object    = "{" { key ("=" | ":") expr [ "," | NEWLINE ] } "}"
fn expr_parser<'tokens, I>() -> impl Parser<'tokens, I, Expression, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let literal = select! {
            Token::True => ExprKind::Literal(Literal::Bool(true)),
            Token::False => ExprKind::Literal(Literal::Bool(false)),
            Token::Null => ExprKind::Literal(Literal::Null),
            Token::Number(n) => ExprKind::Literal(Literal::Number(n)),
            Token::String(text) => text_kind(text),
            Token::Heredoc(text) => text_kind(text),
        }
        .labelled("literal");

        // Newlines inside () and [] never reach the parser.
        let items = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>();

        let args = items
            .clone()
            .then(just(Token::Ellipsis).or_not())
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let function_name = ident_parser()
            .separated_by(just(Token::DoubleColon))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|parts| parts.join("::"));

        let call = function_name
            .then(args)
            .map(|(name, (args, expand))| ExprKind::Call {
                name,
                args,
                expand: expand.is_some(),
            })
            .labelled("function call");

        let traversal = ident_parser()
            .then(
                just(Token::Dot)
                    .ignore_then(ident_parser())
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(root, rest)| {
                let mut steps = vec![root];
                steps.extend(rest);
                ExprKind::Traversal(steps)
            })
            .labelled("reference");

        let for_intro = keyword("for")
            .ignore_then(ident_parser())
            .then(just(Token::Comma).ignore_then(ident_parser()).or_not())
            .then_ignore(keyword("in"))
            .then(expr.clone())
            .then_ignore(just(Token::Colon))
            .map(|((first, second), collection)| match second {
                Some(value_var) => (Some(first), value_var, collection),
                None => (None, first, collection),
            });
        let for_condition = keyword("if").ignore_then(expr.clone()).or_not();

        let for_tuple = for_intro
            .clone()
            .then(expr.clone())
            .then(for_condition.clone())
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(|(((key_var, value_var, collection), value), condition)| {
                ExprKind::For(Box::new(ForExpr {
                    key_var,
                    value_var,
                    collection,
                    key: None,
                    value,
                    grouped: false,
                    condition,
                }))
            })
            .labelled("for expression");

        let tuple = items
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(ExprKind::Tuple)
            .labelled("tuple");

        let for_object = newlines()
            .ignore_then(for_intro)
            .then_ignore(newlines())
            .then(expr.clone())
            .then_ignore(newlines())
            .then_ignore(just(Token::FatArrow))
            .then_ignore(newlines())
            .then(expr.clone())
            .then(just(Token::Ellipsis).or_not())
            .then_ignore(newlines())
            .then(for_condition)
            .then_ignore(newlines())
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(
                |(((((key_var, value_var, collection), key), value), grouped), condition)| {
                    ExprKind::For(Box::new(ForExpr {
                        key_var,
                        value_var,
                        collection,
                        key: Some(key),
                        value,
                        grouped: grouped.is_some(),
                        condition,
                    }))
                },
            )
            .labelled("for expression");

        // Object items end with a comma, a newline, or the closing brace.
        let separators = choice((just(Token::Comma), just(Token::Newline))).repeated();
        let name_key = select! {
            Token::Ident(s) => ObjectKey::Name(s),
            Token::String(Text::Literal(s)) => ObjectKey::Name(s),
        };
        let key = choice((
            name_key,
            expr.clone().map(|key| ObjectKey::Expression(Box::new(key))),
        ))
        .map_with(|key, e| (key, e.span()))
        .labelled("object key");
        let object_item = key
            .then_ignore(choice((just(Token::Eq), just(Token::Colon))))
            .then(expr.clone())
            .map(|((key, key_span), value): ((ObjectKey, Span), Expression)| ObjectItem {
                key,
                key_span: key_span.into(),
                value,
            });
        let object = just(Token::LBrace)
            .ignore_then(separators.clone())
            .ignore_then(
                object_item
                    .then_ignore(separators)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Token::RBrace))
            .map(ExprKind::Object)
            .labelled("object");

        let primary = choice((
            literal, call, traversal, for_tuple, tuple, for_object, object,
        ))
        .map_with(|kind, e| Expression::new(kind, e.span()));

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .labelled("parenthesized expression");

        let step = choice((
            just(Token::Dot).ignore_then(just(Token::Star)).to(Step::Splat),
            just(Token::LBracket)
                .ignore_then(just(Token::Star))
                .ignore_then(just(Token::RBracket))
                .to(Step::Splat),
            just(Token::Dot).ignore_then(ident_parser()).map(Step::Attr),
            just(Token::Dot)
                .ignore_then(select! { Token::Number(n) => n })
                .map_with(|n, e| {
                    Step::Index(Expression::new(
                        ExprKind::Literal(Literal::Number(n)),
                        e.span(),
                    ))
                }),
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Step::Index),
        ))
        .map_with(|step, e| (step, e.span()));

        let postfix = choice((primary, parenthesized)).foldl(
            step.repeated(),
            |target, (step, span): (Step, Span)| {
                let span = target.span.to(span.into());
                let target = Box::new(target);
                let kind = match step {
                    Step::Attr(name) => ExprKind::GetAttr { target, name },
                    Step::Index(key) => ExprKind::Index {
                        target,
                        key: Box::new(key),
                    },
                    Step::Splat => ExprKind::Splat(target),
                };
                Expression::new(kind, span)
            },
        );

        let unary = recursive(|unary| {
            choice((just(Token::Minus), just(Token::Bang)))
                .then(unary)
                .map_with(|(op, operand), e| {
                    let operand = Box::new(operand);
                    let kind = match op {
                        Token::Minus => ExprKind::Negate(operand),
                        _ => ExprKind::Not(operand),
                    };
                    Expression::new(kind, e.span())
                })
                .or(postfix)
        });

        let product = binary(
            unary,
            select! {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
            },
        );
        let sum = binary(
            product,
            select! {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
            },
        );
        let compare = binary(
            sum,
            select! {
                Token::Lt => BinaryOp::Lt,
                Token::Gt => BinaryOp::Gt,
                Token::LtEq => BinaryOp::LtEq,
                Token::GtEq => BinaryOp::GtEq,
            },
        );
        let equality = binary(
            compare,
            select! {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
            },
        );
        let and = binary(equality, just(Token::And).to(BinaryOp::And));
        let or = binary(and, just(Token::Or).to(BinaryOp::Or));

        or.then(
            just(Token::Question)
                .ignore_then(expr.clone())
                .then_ignore(just(Token::Colon))
                .then(expr)
                .or_not(),
        )
        .map(|(condition, branches)| match branches {
            Some((then, otherwise)) => {
                let span = condition.span.to(otherwise.span);
                Expression::new(
                    ExprKind::Conditional {
                        condition: Box::new(condition),
                        then: Box::new(then),
                        otherwise: Box::new(otherwise),
                    },
                    span,
                )
            }
            None => condition,
        })
        .labelled("expression")
    })
    .boxed()
}

fn text_kind(text: Text) -> ExprKind {
    match text {
        Text::Literal(s) => ExprKind::Literal(Literal::String(s)),
        Text::Template(raw) => ExprKind::Template(raw),
    }
}
