//! Name resolution and type checking.
//!
//! The binder walks the unbound [`Expr`] tree with a known input type and
//! produces a [`BoundExpr`] in which every node is typed, every name is
//! resolved and every implicit coercion is an explicit node.
//!
//! Scopes form a stack. The bottom scope is the implicit parameter `it`,
//! typed as the stage input; each query operator argument pushes one more
//! scope for the element, named after the lambda parameter, or `it` when
//! the argument is not written as a lambda.

mod conversions;
mod operators;
mod queries;

use std::sync::Arc;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Ident, Literal, NumberLiteral},
    bound::{BoundExpr, BoundKind, Coercion},
    catalog::{Builtin, Catalog, Member, Signature, Symbol, find_member, members},
    types::{RecordField, RecordType, Type},
    value::Value,
};

pub use conversions::{coerce, is_implicit};

/// Errors raised when a well-formed expression cannot be typed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("unknown identifier '{name}' at offset {offset}")]
    UnknownIdentifier { name: String, offset: usize },

    #[error("'{ty}' has no member named '{member}' (offset {offset})")]
    UnknownMember {
        member: String,
        ty: String,
        offset: usize,
    },

    #[error("no conversion from {from} to {to} (offset {offset})")]
    InvalidConversion { from: Type, to: Type, offset: usize },

    #[error("operator '{op}' cannot be applied to {left} and {right} (offset {offset})")]
    IncompatibleOperands {
        op: String,
        left: Type,
        right: Type,
        offset: usize,
    },

    #[error("operator '{op}' cannot be applied to {ty} (offset {offset})")]
    InvalidOperand { op: String, ty: Type, offset: usize },

    #[error("expected {expected} but found {found} (offset {offset})")]
    TypeMismatch {
        expected: Type,
        found: Type,
        offset: usize,
    },

    #[error("{ty} is not nullable (offset {offset})")]
    NotNullable { ty: Type, offset: usize },

    #[error("'{name}' takes {expected} argument(s) but {found} were given (offset {offset})")]
    WrongArity {
        name: String,
        expected: String,
        found: usize,
        offset: usize,
    },

    #[error("no overload of '{name}' accepts ({args}) (offset {offset})")]
    NoMatchingOverload {
        name: String,
        args: String,
        offset: usize,
    },

    #[error("call to '{name}' with ({args}) is ambiguous (offset {offset})")]
    AmbiguousCall {
        name: String,
        args: String,
        offset: usize,
    },

    #[error("member '{name}' is declared more than once (offset {offset})")]
    DuplicateMember { name: String, offset: usize },

    #[error("cannot infer the element type of the array at offset {offset}")]
    CannotInferElementType { offset: usize },

    #[error("a lambda is only allowed as a query operator argument (offset {offset})")]
    MisplacedLambda { offset: usize },

    #[error("'{name}' is a type and cannot be used as a value (offset {offset})")]
    TypeUsedAsValue { name: String, offset: usize },

    #[error("'{name}' is a method and must be called (offset {offset})")]
    MethodWithoutCall { name: String, offset: usize },

    #[error("expression at offset {offset} cannot be called")]
    NotCallable { offset: usize },

    #[error("{ty} cannot be indexed (offset {offset})")]
    NotIndexable { ty: Type, offset: usize },

    #[error("invalid regular expression '{pattern}': {message} (offset {offset})")]
    InvalidPattern {
        pattern: String,
        message: String,
        offset: usize,
    },
}

/// Binds `expr` against the standard catalog.
pub fn bind(expr: &Expr, input: &Type) -> Result<BoundExpr, BindError> {
    Binder::new(Catalog::standard(), input.clone()).bind(expr)
}

struct Scope {
    /// Folded parameter name
    name: String,
    ty: Type,
}

pub struct Binder<'c> {
    catalog: &'c Catalog,
    scopes: Vec<Scope>,
}

impl<'c> Binder<'c> {
    pub fn new(catalog: &'c Catalog, input: Type) -> Self {
        Binder {
            catalog,
            scopes: vec![Scope {
                name: "it".to_string(),
                ty: input,
            }],
        }
    }

    pub fn bind(&mut self, expr: &Expr) -> Result<BoundExpr, BindError> {
        self.bind_expr(expr, false)
    }

    /// Binds `expr` as a value. `np` is set inside `np(...)` and flows only
    /// through receivers of member access, calls and indexers.
    fn bind_expr(&mut self, expr: &Expr, np: bool) -> Result<BoundExpr, BindError> {
        match expr {
            Expr::Literal(literal) => Ok(bind_literal(literal)),
            Expr::Null => Ok(BoundExpr::constant(Value::Null, Type::Null)),
            Expr::It { offset } => self.bind_parameter("it", *offset),
            Expr::Identifier(ident) => self.bind_identifier(ident),
            Expr::Member { object, name } => self.bind_member(object, name, np),
            Expr::Index {
                object,
                args,
                offset,
            } => self.bind_index(object, args, *offset, np),
            Expr::Call {
                callee,
                args,
                offset,
            } => self.bind_call(callee, args, *offset, np),
            Expr::NullableConversion { target, args } => {
                let ty = self.conversion_target(target)?;
                if !ty.is_value_type() {
                    return Err(BindError::NotNullable {
                        ty,
                        offset: target.offset,
                    });
                }
                self.bind_conversion(Type::nullable_of(ty), target, args)
            }
            Expr::Unary {
                op,
                operand,
                offset,
            } => {
                let operand = self.bind_expr(operand, false)?;
                operators::unary(*op, operand, *offset)
            }
            Expr::BinaryOp {
                op,
                left,
                right,
                offset,
            } => {
                let left = self.bind_expr(left, false)?;
                let right = self.bind_expr(right, false)?;
                match op {
                    BinOp::NullCoalesce => operators::coalesce(left, right, *offset),
                    _ => operators::binary(*op, left, right, *offset),
                }
            }
            Expr::Conditional {
                condition,
                when_true,
                when_false,
                offset,
            } => self.bind_conditional(condition, when_true, when_false, *offset),
            Expr::NullPropagation { operand, .. } => self.bind_expr(operand, true),
            Expr::Array { elements, offset } => self.bind_array(elements, *offset),
            Expr::Object { members, .. } => self.bind_object(members),
            Expr::Lambda { param, .. } => Err(BindError::MisplacedLambda {
                offset: param.offset,
            }),
        }
    }

    fn lookup_scope(&self, folded: &str) -> Option<(usize, &Type)> {
        self.scopes
            .iter()
            .rev()
            .enumerate()
            .find(|(_, scope)| scope.name == folded)
            .map(|(depth, scope)| (depth, &scope.ty))
    }

    fn bind_parameter(&self, folded: &str, offset: usize) -> Result<BoundExpr, BindError> {
        let (depth, ty) =
            self.lookup_scope(folded)
                .ok_or_else(|| BindError::UnknownIdentifier {
                    name: folded.to_string(),
                    offset,
                })?;
        Ok(BoundExpr::new(BoundKind::Parameter { depth }, ty.clone()))
    }

    fn bind_identifier(&self, ident: &Ident) -> Result<BoundExpr, BindError> {
        let folded = ident.folded();
        if self.lookup_scope(&folded).is_some() {
            return self.bind_parameter(&folded, ident.offset);
        }
        match self.catalog.lookup(&ident.name) {
            Some(_) => Err(BindError::TypeUsedAsValue {
                name: ident.name.clone(),
                offset: ident.offset,
            }),
            None => Err(BindError::UnknownIdentifier {
                name: ident.name.clone(),
                offset: ident.offset,
            }),
        }
    }

    /// A bare name that refers to a library type rather than a parameter.
    fn static_symbol(&self, expr: &Expr) -> Option<&'c Symbol> {
        match expr {
            Expr::Identifier(ident) if self.lookup_scope(&ident.folded()).is_none() => {
                self.catalog.lookup(&ident.name)
            }
            _ => None,
        }
    }

    fn conversion_target(&self, ident: &Ident) -> Result<Type, BindError> {
        let symbol = self
            .catalog
            .lookup(&ident.name)
            .ok_or_else(|| BindError::UnknownIdentifier {
                name: ident.name.clone(),
                offset: ident.offset,
            })?;
        symbol
            .conversion_target()
            .cloned()
            .ok_or_else(|| BindError::TypeUsedAsValue {
                name: ident.name.clone(),
                offset: ident.offset,
            })
    }

    fn bind_member(&mut self, object: &Expr, name: &Ident, np: bool) -> Result<BoundExpr, BindError> {
        if let Some(symbol) = self.static_symbol(object) {
            return match symbol.member(&name.name) {
                Some(Member::Constant { value, ty, .. }) => {
                    Ok(BoundExpr::constant(value.clone(), ty.clone()))
                }
                Some(Member::Method { name: method, .. }) => Err(BindError::MethodWithoutCall {
                    name: method.to_string(),
                    offset: name.offset,
                }),
                Some(Member::Property { .. }) | None => Err(BindError::UnknownMember {
                    member: name.name.clone(),
                    ty: symbol.name.to_string(),
                    offset: name.offset,
                }),
            };
        }

        let receiver = self.bind_expr(object, np)?;
        let null_conditional = np && receiver.ty.accepts_null() && receiver.ty != Type::Null;

        if null_conditional
            && let Some(found) = self.bind_property(&receiver, receiver.ty.underlying(), name, true)
        {
            return found;
        }
        self.bind_property(&receiver, &receiver.ty, name, false)
            .unwrap_or_else(|| {
                Err(BindError::UnknownMember {
                    member: name.name.clone(),
                    ty: receiver.ty.to_string(),
                    offset: name.offset,
                })
            })
    }

    /// Resolves `name` as a field or property of `lookup`, the receiver's
    /// type or, for null-conditional access, its underlying type.
    fn bind_property(
        &self,
        receiver: &BoundExpr,
        lookup: &Type,
        name: &Ident,
        null_conditional: bool,
    ) -> Option<Result<BoundExpr, BindError>> {
        let lift = |ty: Type| if null_conditional { ty.nullable() } else { ty };

        if let Type::Record(record) = lookup
            && let Some(index) = record.field_index(&name.name)
        {
            let ty = lift(record.fields[index].ty.clone());
            let kind = BoundKind::Field {
                receiver: Box::new(receiver.clone()),
                index,
                null_conditional,
            };
            return Some(Ok(BoundExpr::new(kind, ty)));
        }

        let members = members::instance_members(lookup);
        let result = match find_member(&members, &name.name)? {
            Member::Property { ty, builtin, .. } => {
                let kind = BoundKind::Call {
                    builtin: *builtin,
                    args: vec![receiver.clone()],
                    null_conditional,
                };
                Ok(BoundExpr::new(kind, lift(ty.clone())))
            }
            Member::Constant { value, ty, .. } => Ok(BoundExpr::constant(value.clone(), ty.clone())),
            Member::Method { name: method, .. } => Err(BindError::MethodWithoutCall {
                name: method.to_string(),
                offset: name.offset,
            }),
        };
        Some(result)
    }

    fn bind_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        offset: usize,
        np: bool,
    ) -> Result<BoundExpr, BindError> {
        match callee {
            Expr::Identifier(ident) if self.lookup_scope(&ident.folded()).is_none() => {
                let target = self.conversion_target(ident)?;
                self.bind_conversion(target, ident, args)
            }
            Expr::Member { object, name } => {
                if let Some(symbol) = self.static_symbol(object) {
                    return self.bind_static_call(symbol, name, args);
                }
                let receiver = self.bind_expr(object, np)?;
                self.bind_method_call(receiver, name, args, np)
            }
            _ => Err(BindError::NotCallable { offset }),
        }
    }

    fn bind_conversion(
        &mut self,
        target: Type,
        name: &Ident,
        args: &[Expr],
    ) -> Result<BoundExpr, BindError> {
        if args.len() != 1 {
            return Err(BindError::WrongArity {
                name: name.name.clone(),
                expected: "1".to_string(),
                found: args.len(),
                offset: name.offset,
            });
        }
        let operand = self.bind_expr(&args[0], false)?;
        conversions::explicit(operand, &target, name.offset)
    }

    fn bind_static_call(
        &mut self,
        symbol: &Symbol,
        name: &Ident,
        args: &[Expr],
    ) -> Result<BoundExpr, BindError> {
        let overloads = match symbol.member(&name.name) {
            Some(Member::Method { overloads, .. }) => overloads,
            Some(_) => return Err(BindError::NotCallable { offset: name.offset }),
            None => {
                return Err(BindError::UnknownMember {
                    member: name.name.clone(),
                    ty: symbol.name.to_string(),
                    offset: name.offset,
                });
            }
        };

        let args = self.bind_arguments(args)?;
        let (signature, args) = resolve_overload(overloads, args, name)?;
        validate_pattern(signature.builtin, &args, name.offset)?;

        let kind = BoundKind::Call {
            builtin: signature.builtin,
            args,
            null_conditional: false,
        };
        Ok(BoundExpr::new(kind, signature.ret.clone()))
    }

    fn bind_method_call(
        &mut self,
        receiver: BoundExpr,
        name: &Ident,
        args: &[Expr],
        np: bool,
    ) -> Result<BoundExpr, BindError> {
        let null_conditional = np && receiver.ty.accepts_null() && receiver.ty != Type::Null;
        let lookup = if null_conditional {
            receiver.ty.underlying().clone()
        } else {
            receiver.ty.clone()
        };

        if lookup.is_enumerable() && queries::is_query_operator(&name.name) {
            return self.bind_query(receiver, &lookup, name, args, null_conditional);
        }

        let mut members = members::instance_members(&lookup);
        let mut null_conditional = null_conditional;
        if null_conditional && find_member(&members, &name.name).is_none() {
            members = members::instance_members(&receiver.ty);
            null_conditional = false;
        }

        let overloads = match find_member(&members, &name.name) {
            Some(Member::Method { overloads, .. }) => overloads,
            Some(_) => return Err(BindError::NotCallable { offset: name.offset }),
            None => {
                return Err(BindError::UnknownMember {
                    member: name.name.clone(),
                    ty: receiver.ty.to_string(),
                    offset: name.offset,
                });
            }
        };

        let args = self.bind_arguments(args)?;
        let (signature, args) = resolve_overload(overloads, args, name)?;
        validate_pattern(signature.builtin, &args, name.offset)?;

        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(receiver);
        call_args.extend(args);
        if signature.builtin == Builtin::GetValueOrDefault && call_args.len() == 1 {
            call_args.push(BoundExpr::constant(
                signature.ret.default_value(),
                signature.ret.clone(),
            ));
        }

        let ty = if null_conditional {
            signature.ret.clone().nullable()
        } else {
            signature.ret.clone()
        };
        let kind = BoundKind::Call {
            builtin: signature.builtin,
            args: call_args,
            null_conditional,
        };
        Ok(BoundExpr::new(kind, ty))
    }

    fn bind_arguments(&mut self, args: &[Expr]) -> Result<Vec<BoundExpr>, BindError> {
        args.iter().map(|arg| self.bind_expr(arg, false)).collect()
    }

    /// Binds a query operator argument with the element pushed as a new
    /// scope: `x => body` names it `x`, any other expression names it `it`.
    fn bind_lambda(&mut self, arg: &Expr, element: &Type) -> Result<BoundExpr, BindError> {
        let (name, body) = match arg {
            Expr::Lambda { param, body } => (param.folded(), body.as_ref()),
            other => ("it".to_string(), other),
        };
        self.scopes.push(Scope {
            name,
            ty: element.clone(),
        });
        let result = self.bind_expr(body, false);
        self.scopes.pop();
        result
    }

    fn bind_index(
        &mut self,
        object: &Expr,
        args: &[Expr],
        offset: usize,
        np: bool,
    ) -> Result<BoundExpr, BindError> {
        let receiver = self.bind_expr(object, np)?;
        let null_conditional = np && receiver.ty.accepts_null() && receiver.ty != Type::Null;
        let lookup = if null_conditional {
            receiver.ty.underlying().clone()
        } else {
            receiver.ty.clone()
        };

        let element = match &lookup {
            Type::Array(element) | Type::Sequence(element) => (**element).clone(),
            Type::String => Type::Char,
            other => {
                return Err(BindError::NotIndexable {
                    ty: other.clone(),
                    offset,
                });
            }
        };
        if args.len() != 1 {
            return Err(BindError::WrongArity {
                name: "indexer".to_string(),
                expected: "1".to_string(),
                found: args.len(),
                offset,
            });
        }

        let index = self.bind_expr(&args[0], false)?;
        let index = coerce(index, &Type::Int32).map_err(|index| BindError::TypeMismatch {
            expected: Type::Int32,
            found: index.ty,
            offset,
        })?;

        let ty = if null_conditional {
            element.nullable()
        } else {
            element
        };
        let kind = BoundKind::Index {
            receiver: Box::new(receiver),
            index: Box::new(index),
            null_conditional,
        };
        Ok(BoundExpr::new(kind, ty))
    }

    fn bind_conditional(
        &mut self,
        condition: &Expr,
        when_true: &Expr,
        when_false: &Expr,
        offset: usize,
    ) -> Result<BoundExpr, BindError> {
        let condition = self.bind_expr(condition, false)?;
        if condition.ty != Type::Boolean {
            return Err(BindError::TypeMismatch {
                expected: Type::Boolean,
                found: condition.ty,
                offset,
            });
        }
        let when_true = self.bind_expr(when_true, false)?;
        let when_false = self.bind_expr(when_false, false)?;
        let (when_true, when_false) = unify(when_true, when_false, offset)?;

        let ty = when_true.ty.clone();
        let kind = BoundKind::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        };
        Ok(BoundExpr::new(kind, ty))
    }

    fn bind_array(&mut self, elements: &[Expr], offset: usize) -> Result<BoundExpr, BindError> {
        let mut bound = self.bind_arguments(elements)?.into_iter();
        let first = match bound.next() {
            Some(first) if !first.is_null_literal() => first,
            _ => return Err(BindError::CannotInferElementType { offset }),
        };
        let element = first.ty.clone();

        let mut items = vec![first];
        for item in bound {
            items.push(coerce(item, &element).map_err(|item| BindError::TypeMismatch {
                expected: element.clone(),
                found: item.ty,
                offset,
            })?);
        }

        let kind = BoundKind::NewArray { elements: items };
        Ok(BoundExpr::new(kind, Type::array_of(element)))
    }

    fn bind_object(&mut self, members: &[(Ident, Expr)]) -> Result<BoundExpr, BindError> {
        let mut fields = Vec::with_capacity(members.len());
        let mut values = Vec::with_capacity(members.len());

        for (alias, expr) in members {
            let folded = alias.folded();
            if fields
                .iter()
                .any(|field: &RecordField| field.name.to_lowercase() == folded)
            {
                return Err(BindError::DuplicateMember {
                    name: alias.name.clone(),
                    offset: alias.offset,
                });
            }

            let mut value = self.bind_expr(expr, false)?;
            if value.is_null_literal() {
                value = with_coercion(value, Coercion::NullLiteral, Type::Object);
            }
            fields.push(RecordField {
                name: alias.name.clone(),
                ty: value.ty.clone(),
            });
            values.push(value);
        }

        let record = Arc::new(RecordType::new(fields));
        let kind = BoundKind::NewRecord {
            ty: Arc::clone(&record),
            fields: values,
        };
        Ok(BoundExpr::new(kind, Type::Record(record)))
    }
}

fn bind_literal(literal: &Literal) -> BoundExpr {
    match literal {
        Literal::Boolean(b) => BoundExpr::constant(Value::Boolean(*b), Type::Boolean),
        Literal::Char(c) => BoundExpr::constant(Value::Char(*c), Type::Char),
        Literal::String(s) => BoundExpr::constant(Value::String(s.clone()), Type::String),
        Literal::Number(n) => match *n {
            NumberLiteral::Int32(v) => BoundExpr::constant(Value::Int32(v), Type::Int32),
            NumberLiteral::UInt32(v) => BoundExpr::constant(Value::UInt32(v), Type::UInt32),
            NumberLiteral::Int64(v) => BoundExpr::constant(Value::Int64(v), Type::Int64),
            NumberLiteral::UInt64(v) => BoundExpr::constant(Value::UInt64(v), Type::UInt64),
            NumberLiteral::Single(v) => BoundExpr::constant(Value::Single(v), Type::Single),
            NumberLiteral::Double(v) => BoundExpr::constant(Value::Double(v), Type::Double),
            NumberLiteral::Decimal(v) => BoundExpr::constant(Value::Decimal(v), Type::Decimal),
        },
    }
}

pub(crate) fn with_coercion(operand: BoundExpr, coercion: Coercion, ty: Type) -> BoundExpr {
    let kind = BoundKind::Coerce {
        coercion,
        operand: Box::new(operand),
    };
    BoundExpr::new(kind, ty)
}

/// Gives both branches of a conditional one type.
fn unify(
    when_true: BoundExpr,
    when_false: BoundExpr,
    offset: usize,
) -> Result<(BoundExpr, BoundExpr), BindError> {
    if when_true.ty == when_false.ty {
        return Ok((when_true, when_false));
    }

    let target = when_true.ty.clone();
    let when_false = match coerce(when_false, &target) {
        Ok(when_false) => return Ok((when_true, when_false)),
        Err(when_false) => when_false,
    };
    let target = when_false.ty.clone();
    let when_true = match coerce(when_true, &target) {
        Ok(when_true) => return Ok((when_true, when_false)),
        Err(when_true) => when_true,
    };

    // `cond ? 1 : null` is a Nullable<Int32>
    let lifted = if when_true.is_null_literal() && when_false.ty.is_value_type() {
        Some(Type::nullable_of(when_false.ty.clone()))
    } else if when_false.is_null_literal() && when_true.ty.is_value_type() {
        Some(Type::nullable_of(when_true.ty.clone()))
    } else {
        None
    };
    if let Some(target) = lifted {
        match (coerce(when_true, &target), coerce(when_false, &target)) {
            (Ok(t), Ok(f)) => return Ok((t, f)),
            (t, f) => {
                return Err(BindError::TypeMismatch {
                    expected: t.unwrap_or_else(|t| t).ty,
                    found: f.unwrap_or_else(|f| f).ty,
                    offset,
                });
            }
        }
    }

    Err(BindError::TypeMismatch {
        expected: when_true.ty,
        found: when_false.ty,
        offset,
    })
}

fn describe_args(args: &[BoundExpr]) -> String {
    args.iter()
        .map(|arg| arg.ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Picks the unique best applicable overload and coerces the arguments to
/// its parameter types.
///
/// A candidate is applicable when every argument converts implicitly to the
/// corresponding parameter; it is the best when its parameters convert
/// implicitly to those of every other applicable candidate.
fn resolve_overload<'s>(
    overloads: &'s [Signature],
    args: Vec<BoundExpr>,
    name: &Ident,
) -> Result<(&'s Signature, Vec<BoundExpr>), BindError> {
    let candidates: Vec<&Signature> = overloads
        .iter()
        .filter(|sig| sig.params.len() == args.len())
        .collect();

    if candidates.is_empty() {
        let mut arities: Vec<usize> = overloads.iter().map(|sig| sig.params.len()).collect();
        arities.sort_unstable();
        arities.dedup();
        return Err(BindError::WrongArity {
            name: name.name.clone(),
            expected: arities
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            found: args.len(),
            offset: name.offset,
        });
    }

    let applicable: Vec<&Signature> = candidates
        .into_iter()
        .filter(|sig| {
            sig.params
                .iter()
                .zip(&args)
                .all(|(param, arg)| is_implicit(&arg.ty, param))
        })
        .collect();

    if applicable.is_empty() {
        return Err(BindError::NoMatchingOverload {
            name: name.name.clone(),
            args: describe_args(&args),
            offset: name.offset,
        });
    }

    fn better_or_equal(a: &Signature, b: &Signature) -> bool {
        a.params
            .iter()
            .zip(&b.params)
            .all(|(pa, pb)| is_implicit(pa, pb))
    }
    let best: Vec<&Signature> = applicable
        .iter()
        .copied()
        .filter(|a| applicable.iter().all(|b| better_or_equal(a, b)))
        .collect();

    let [signature] = best.as_slice() else {
        return Err(BindError::AmbiguousCall {
            name: name.name.clone(),
            args: describe_args(&args),
            offset: name.offset,
        });
    };

    let mut coerced = Vec::with_capacity(args.len());
    for (arg, param) in args.into_iter().zip(&signature.params) {
        coerced.push(coerce(arg, param).map_err(|arg| BindError::TypeMismatch {
            expected: param.clone(),
            found: arg.ty,
            offset: name.offset,
        })?);
    }
    Ok((*signature, coerced))
}

/// Literal patterns are compiled once here so a bad pattern fails the
/// build instead of every element.
fn validate_pattern(builtin: Builtin, args: &[BoundExpr], offset: usize) -> Result<(), BindError> {
    if !builtin.takes_pattern() {
        return Ok(());
    }
    if let Some(BoundExpr {
        kind: BoundKind::Constant(Value::String(pattern)),
        ..
    }) = args.get(1)
        && let Err(err) = regex::Regex::new(pattern)
    {
        return Err(BindError::InvalidPattern {
            pattern: pattern.clone(),
            message: err.to_string(),
            offset,
        });
    }
    Ok(())
}
