//! Tree-walking evaluator for parsed analysis snippets.
//!
//! Snippets run against a clone of the session frame bound to the name `df`.
//! Aggregations and vectorized arithmetic are routed through the polars lazy
//! engine so dtype promotion and null handling follow one code path. The
//! grammar has no loops or definitions, so every program terminates.

use std::collections::HashMap;

use polars::prelude::*;

use super::parser::{BinOp, Expr as Ast, Stmt, UnOp};
use super::SandboxError;
use crate::stats::{column_stats, is_numeric_dtype};

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone)]
pub enum Value {
    Frame(DataFrame),
    Series(Series),
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
    Grouped {
        frame: DataFrame,
        keys: Vec<String>,
    },
    GroupedColumn {
        frame: DataFrame,
        keys: Vec<String>,
        column: String,
    },
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Frame(_) => "dataframe",
            Value::Series(_) => "series",
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Grouped { .. } => "groupby",
            Value::GroupedColumn { .. } => "grouped column",
        }
    }
}

/// Runs every statement, then extracts `result` if the snippet assigned one,
/// falling back to whatever `df` refers to afterwards.
pub fn execute(df: &DataFrame, stmts: &[Stmt]) -> Result<Value, SandboxError> {
    let mut env: HashMap<String, Value> = HashMap::new();
    env.insert("df".to_string(), Value::Frame(df.clone()));

    for stmt in stmts {
        match stmt {
            Stmt::Assign { name, value } => {
                let value = eval_expr(&env, value)?;
                env.insert(name.clone(), value);
            }
            Stmt::Expr(expr) => {
                eval_expr(&env, expr)?;
            }
        }
    }

    env.remove("result")
        .or_else(|| env.remove("df"))
        .ok_or_else(|| SandboxError::Execution("no value produced".into()))
}

fn eval_expr(env: &HashMap<String, Value>, ast: &Ast) -> Result<Value, SandboxError> {
    match ast {
        Ast::Name(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| SandboxError::Execution(format!("name '{name}' is not defined"))),
        Ast::Int(v) => Ok(Value::Scalar(ScalarValue::Int(*v))),
        Ast::Float(v) => Ok(Value::Scalar(ScalarValue::Float(*v))),
        Ast::Str(s) => Ok(Value::Scalar(ScalarValue::Str(s.clone()))),
        Ast::Bool(b) => Ok(Value::Scalar(ScalarValue::Bool(*b))),
        Ast::List(items) => {
            let mut scalars = Vec::with_capacity(items.len());
            for item in items {
                match eval_expr(env, item)? {
                    Value::Scalar(s) => scalars.push(s),
                    other => {
                        return Err(SandboxError::Execution(format!(
                            "lists may only contain scalar values, got {}",
                            other.kind()
                        )));
                    }
                }
            }
            Ok(Value::List(scalars))
        }
        Ast::Index { target, index } => {
            let target = eval_expr(env, target)?;
            let index = eval_expr(env, index)?;
            eval_index(target, index)
        }
        Ast::Attr { target, name } => {
            let target = eval_expr(env, target)?;
            eval_attr(target, name)
        }
        Ast::Call {
            target,
            method,
            args,
            kwargs,
        } => {
            let target = eval_expr(env, target)?;
            let args: Vec<Value> = args
                .iter()
                .map(|a| eval_expr(env, a))
                .collect::<Result<_, _>>()?;
            let kwargs: Vec<(String, Value)> = kwargs
                .iter()
                .map(|(k, v)| Ok((k.clone(), eval_expr(env, v)?)))
                .collect::<Result<_, SandboxError>>()?;
            eval_call(target, method, &args, &kwargs)
        }
        Ast::Unary { op, operand } => {
            let operand = eval_expr(env, operand)?;
            eval_unary(*op, operand)
        }
        Ast::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(env, lhs)?;
            let rhs = eval_expr(env, rhs)?;
            eval_binary(*op, lhs, rhs)
        }
    }
}

fn eval_index(target: Value, index: Value) -> Result<Value, SandboxError> {
    match (target, index) {
        (Value::Frame(df), Value::Scalar(ScalarValue::Str(name))) => {
            let series = column_series(&df, &name)?;
            Ok(Value::Series(series))
        }
        (Value::Frame(df), Value::List(items)) => {
            let names = scalar_names(&items)?;
            for name in &names {
                column_series(&df, name)?;
            }
            let selected = df
                .select(names.iter().map(|n| n.as_str()))
                .map_err(|e| SandboxError::Execution(e.to_string()))?;
            Ok(Value::Frame(selected))
        }
        (Value::Frame(df), Value::Series(mask)) => {
            let mask = mask
                .bool()
                .map_err(|_| SandboxError::Execution("filter mask must be boolean".into()))?;
            let filtered = df.filter(mask)?;
            Ok(Value::Frame(filtered))
        }
        (Value::Grouped { frame, keys }, Value::Scalar(ScalarValue::Str(column))) => {
            column_series(&frame, &column)?;
            Ok(Value::GroupedColumn {
                frame,
                keys,
                column,
            })
        }
        (Value::Series(s), Value::Scalar(ScalarValue::Int(i))) => {
            let len = s.len() as i64;
            let pos = if i < 0 { len + i } else { i };
            if pos < 0 || pos >= len {
                return Err(SandboxError::Execution(format!(
                    "index {i} out of bounds for length {len}"
                )));
            }
            let av = s.get(pos as usize)?;
            Ok(Value::Scalar(any_to_scalar(&av)))
        }
        (target, index) => Err(SandboxError::Execution(format!(
            "cannot index {} with {}",
            target.kind(),
            index.kind()
        ))),
    }
}

fn eval_attr(target: Value, name: &str) -> Result<Value, SandboxError> {
    match (&target, name) {
        (Value::Frame(df), "shape") => Ok(Value::List(vec![
            ScalarValue::Int(df.height() as i64),
            ScalarValue::Int(df.width() as i64),
        ])),
        (Value::Frame(df), "columns") => Ok(Value::List(
            df.get_column_names()
                .iter()
                .map(|n| ScalarValue::Str(n.to_string()))
                .collect(),
        )),
        _ => Err(SandboxError::Execution(format!(
            "unknown attribute '{name}' on {}",
            target.kind()
        ))),
    }
}

fn eval_call(
    target: Value,
    method: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, SandboxError> {
    match target {
        Value::Frame(df) => call_frame(df, method, args, kwargs),
        Value::Series(s) => call_series(s, method, args, kwargs),
        Value::GroupedColumn {
            frame,
            keys,
            column,
        } => call_grouped_column(&frame, &keys, &column, method),
        other => Err(SandboxError::Execution(format!(
            "{} has no method '{method}'",
            other.kind()
        ))),
    }
}

fn call_frame(
    df: DataFrame,
    method: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, SandboxError> {
    match method {
        "head" => {
            let n = arg_usize(args, kwargs, 0, "n", 5)?;
            Ok(Value::Frame(df.head(Some(n))))
        }
        "tail" => {
            let n = arg_usize(args, kwargs, 0, "n", 5)?;
            Ok(Value::Frame(df.tail(Some(n))))
        }
        "sort_values" => {
            let by = take_arg(args, kwargs, 0, "by").ok_or_else(|| {
                SandboxError::Execution("sort_values requires a 'by' argument".into())
            })?;
            let names = value_names(by)?;
            for name in &names {
                column_series(&df, name)?;
            }
            let ascending = arg_bool(args, kwargs, 1, "ascending", true)?;
            let sorted = df.sort(
                plain_names(&names),
                SortMultipleOptions::default().with_order_descending(!ascending),
            )?;
            Ok(Value::Frame(sorted))
        }
        "groupby" => {
            let by = take_arg(args, kwargs, 0, "by").ok_or_else(|| {
                SandboxError::Execution("groupby requires a 'by' argument".into())
            })?;
            let keys = value_names(by)?;
            for key in &keys {
                column_series(&df, key)?;
            }
            Ok(Value::Grouped { frame: df, keys })
        }
        "dropna" => {
            let dropped = df.lazy().drop_nulls(None).collect()?;
            Ok(Value::Frame(dropped))
        }
        "describe" => Ok(Value::Frame(describe_frame(&df)?)),
        _ => Err(SandboxError::Execution(format!(
            "unknown dataframe method '{method}'"
        ))),
    }
}

fn call_series(
    s: Series,
    method: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, SandboxError> {
    match method {
        "sum" => series_agg(&s, |e| e.sum()).map(Value::Scalar),
        "mean" => series_agg(&s, |e| e.mean()).map(Value::Scalar),
        "min" => series_agg(&s, |e| e.min()).map(Value::Scalar),
        "max" => series_agg(&s, |e| e.max()).map(Value::Scalar),
        "median" => series_agg(&s, |e| e.median()).map(Value::Scalar),
        "std" => series_agg(&s, |e| e.std(1)).map(Value::Scalar),
        "count" => series_agg(&s, |e| e.count()).map(Value::Scalar),
        "nunique" => series_agg(&s, |e| e.n_unique()).map(Value::Scalar),
        "unique" => {
            let name = s.name().clone();
            let frame = DataFrame::new(vec![s.into_column()])?;
            let out = frame
                .lazy()
                .select([col(name.clone()).unique_stable()])
                .collect()?;
            Ok(Value::Series(single_series(&out)?))
        }
        "value_counts" => {
            let name = s.name().clone();
            let frame = DataFrame::new(vec![s.into_column()])?;
            let counted = frame
                .lazy()
                .group_by([col(name.clone())])
                .agg([len().alias("count")])
                .sort(
                    vec![PlSmallStr::from_static("count")],
                    SortMultipleOptions::default().with_order_descending(true),
                )
                .collect()?;
            Ok(Value::Frame(counted))
        }
        "head" => {
            let n = arg_usize(args, kwargs, 0, "n", 5)?;
            Ok(Value::Series(s.head(Some(n))))
        }
        "tail" => {
            let n = arg_usize(args, kwargs, 0, "n", 5)?;
            Ok(Value::Series(s.tail(Some(n))))
        }
        "isna" | "isnull" => Ok(Value::Series(s.is_null().into_series())),
        "notna" | "notnull" => Ok(Value::Series(s.is_not_null().into_series())),
        "tolist" | "to_list" => {
            let mut items = Vec::with_capacity(s.len());
            for i in 0..s.len() {
                let av = s.get(i).unwrap_or(AnyValue::Null);
                items.push(any_to_scalar(&av));
            }
            Ok(Value::List(items))
        }
        _ => Err(SandboxError::Execution(format!(
            "unknown series method '{method}'"
        ))),
    }
}

fn call_grouped_column(
    frame: &DataFrame,
    keys: &[String],
    column: &str,
    method: &str,
) -> Result<Value, SandboxError> {
    let agg: fn(Expr) -> Expr = match method {
        "sum" => |e| e.sum(),
        "mean" => |e| e.mean(),
        "min" => |e| e.min(),
        "max" => |e| e.max(),
        "median" => |e| e.median(),
        "count" => |e| e.count(),
        _ => {
            return Err(SandboxError::Execution(format!(
                "unknown aggregation '{method}' on grouped column"
            )));
        }
    };
    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(k.as_str())).collect();
    let out = frame
        .clone()
        .lazy()
        .group_by(key_exprs)
        .agg([agg(col(column))])
        .sort(
            keys.iter().map(PlSmallStr::from).collect::<Vec<_>>(),
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok(Value::Frame(out))
}

fn eval_unary(op: UnOp, operand: Value) -> Result<Value, SandboxError> {
    match (op, operand) {
        (UnOp::Neg, Value::Scalar(ScalarValue::Int(v))) => {
            Ok(Value::Scalar(ScalarValue::Int(-v)))
        }
        (UnOp::Neg, Value::Scalar(ScalarValue::Float(v))) => {
            Ok(Value::Scalar(ScalarValue::Float(-v)))
        }
        (UnOp::Neg, s @ Value::Series(_)) => {
            eval_binary(BinOp::Mul, s, Value::Scalar(ScalarValue::Int(-1)))
        }
        (UnOp::Not, Value::Scalar(ScalarValue::Bool(b))) => {
            Ok(Value::Scalar(ScalarValue::Bool(!b)))
        }
        // mask == False flips the mask; nulls stay null
        (UnOp::Not, s @ Value::Series(_)) => {
            eval_binary(BinOp::Eq, s, Value::Scalar(ScalarValue::Bool(false)))
        }
        (op, operand) => Err(SandboxError::Execution(format!(
            "cannot apply {op:?} to {}",
            operand.kind()
        ))),
    }
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, SandboxError> {
    match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => scalar_binop(op, &a, &b).map(Value::Scalar),
        (lhs @ Value::Series(_), rhs) | (lhs, rhs @ Value::Series(_)) => {
            series_binop(op, lhs, rhs).map(Value::Series)
        }
        (lhs, rhs) => Err(SandboxError::Execution(format!(
            "unsupported operands: {} {op:?} {}",
            lhs.kind(),
            rhs.kind()
        ))),
    }
}

/// Vectorized binop. At least one side is a series; the other is a series of
/// equal length or a scalar literal.
fn series_binop(op: BinOp, lhs: Value, rhs: Value) -> Result<Series, SandboxError> {
    let mut columns: Vec<Column> = Vec::new();
    let mut out_name = PlSmallStr::from_static("out");

    let lhs_expr = match lhs {
        Value::Series(s) => {
            out_name = s.name().clone();
            let mut renamed = s;
            renamed.rename(PlSmallStr::from_static("lhs"));
            columns.push(renamed.into_column());
            col("lhs")
        }
        Value::Scalar(s) => scalar_to_lit(&s)?,
        other => {
            return Err(SandboxError::Execution(format!(
                "unsupported operand {}",
                other.kind()
            )));
        }
    };
    let rhs_expr = match rhs {
        Value::Series(s) => {
            if let Some(existing) = columns.first() {
                if existing.len() != s.len() {
                    return Err(SandboxError::Execution(format!(
                        "length mismatch: {} vs {}",
                        existing.len(),
                        s.len()
                    )));
                }
            } else {
                out_name = s.name().clone();
            }
            let mut renamed = s;
            renamed.rename(PlSmallStr::from_static("rhs"));
            columns.push(renamed.into_column());
            col("rhs")
        }
        Value::Scalar(s) => scalar_to_lit(&s)?,
        other => {
            return Err(SandboxError::Execution(format!(
                "unsupported operand {}",
                other.kind()
            )));
        }
    };

    let expr = match op {
        BinOp::Add => lhs_expr + rhs_expr,
        BinOp::Sub => lhs_expr - rhs_expr,
        BinOp::Mul => lhs_expr * rhs_expr,
        // true division, matching scalar semantics
        BinOp::Div => lhs_expr.cast(DataType::Float64) / rhs_expr.cast(DataType::Float64),
        BinOp::Eq => lhs_expr.eq(rhs_expr),
        BinOp::Ne => lhs_expr.neq(rhs_expr),
        BinOp::Lt => lhs_expr.lt(rhs_expr),
        BinOp::Le => lhs_expr.lt_eq(rhs_expr),
        BinOp::Gt => lhs_expr.gt(rhs_expr),
        BinOp::Ge => lhs_expr.gt_eq(rhs_expr),
        BinOp::And => lhs_expr.and(rhs_expr),
        BinOp::Or => lhs_expr.or(rhs_expr),
    };

    let frame = DataFrame::new(columns)?;
    let out = frame.lazy().select([expr.alias(out_name)]).collect()?;
    single_series(&out)
}

fn scalar_binop(
    op: BinOp,
    a: &ScalarValue,
    b: &ScalarValue,
) -> Result<ScalarValue, SandboxError> {
    use ScalarValue::*;

    match op {
        BinOp::Add => match (a, b) {
            (Int(x), Int(y)) => x
                .checked_add(*y)
                .map(Int)
                .ok_or_else(|| SandboxError::Execution("integer overflow".into())),
            (Str(x), Str(y)) => Ok(Str(format!("{x}{y}"))),
            _ => numeric_binop(a, b, |x, y| x + y),
        },
        BinOp::Sub => match (a, b) {
            (Int(x), Int(y)) => x
                .checked_sub(*y)
                .map(Int)
                .ok_or_else(|| SandboxError::Execution("integer overflow".into())),
            _ => numeric_binop(a, b, |x, y| x - y),
        },
        BinOp::Mul => match (a, b) {
            (Int(x), Int(y)) => x
                .checked_mul(*y)
                .map(Int)
                .ok_or_else(|| SandboxError::Execution("integer overflow".into())),
            _ => numeric_binop(a, b, |x, y| x * y),
        },
        BinOp::Div => numeric_binop(a, b, |x, y| x / y),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (a, b) {
                (Str(x), Str(y)) => x.partial_cmp(y),
                (Bool(x), Bool(y)) => x.partial_cmp(y),
                _ => match (as_f64(a), as_f64(b)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y),
                    _ => None,
                },
            };
            let Some(ordering) = ordering else {
                return Err(SandboxError::Execution(format!(
                    "cannot compare {a:?} with {b:?}"
                )));
            };
            let result = match op {
                BinOp::Eq => ordering.is_eq(),
                BinOp::Ne => ordering.is_ne(),
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Bool(result))
        }
        BinOp::And | BinOp::Or => match (a, b) {
            (Bool(x), Bool(y)) => Ok(Bool(if op == BinOp::And { *x && *y } else { *x || *y })),
            _ => Err(SandboxError::Execution(
                "'&' and '|' require boolean operands".into(),
            )),
        },
    }
}

fn numeric_binop(
    a: &ScalarValue,
    b: &ScalarValue,
    f: impl FnOnce(f64, f64) -> f64,
) -> Result<ScalarValue, SandboxError> {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => Ok(ScalarValue::Float(f(x, y))),
        _ => Err(SandboxError::Execution(format!(
            "unsupported operands {a:?} and {b:?}"
        ))),
    }
}

fn as_f64(s: &ScalarValue) -> Option<f64> {
    match s {
        ScalarValue::Int(v) => Some(*v as f64),
        ScalarValue::Float(v) => Some(*v),
        _ => None,
    }
}

fn any_to_scalar(av: &AnyValue) -> ScalarValue {
    match av {
        AnyValue::Null => ScalarValue::Null,
        AnyValue::Boolean(b) => ScalarValue::Bool(*b),
        AnyValue::Int8(v) => ScalarValue::Int(*v as i64),
        AnyValue::Int16(v) => ScalarValue::Int(*v as i64),
        AnyValue::Int32(v) => ScalarValue::Int(*v as i64),
        AnyValue::Int64(v) => ScalarValue::Int(*v),
        AnyValue::UInt8(v) => ScalarValue::Int(*v as i64),
        AnyValue::UInt16(v) => ScalarValue::Int(*v as i64),
        AnyValue::UInt32(v) => ScalarValue::Int(*v as i64),
        AnyValue::UInt64(v) => ScalarValue::Int(*v as i64),
        AnyValue::Float32(v) => ScalarValue::Float(*v as f64),
        AnyValue::Float64(v) => ScalarValue::Float(*v),
        AnyValue::String(s) => ScalarValue::Str(s.to_string()),
        AnyValue::StringOwned(s) => ScalarValue::Str(s.to_string()),
        other => ScalarValue::Str(other.to_string()),
    }
}

fn scalar_to_lit(s: &ScalarValue) -> Result<Expr, SandboxError> {
    match s {
        ScalarValue::Int(v) => Ok(lit(*v)),
        ScalarValue::Float(v) => Ok(lit(*v)),
        ScalarValue::Str(v) => Ok(lit(v.clone())),
        ScalarValue::Bool(v) => Ok(lit(*v)),
        ScalarValue::Null => Err(SandboxError::Execution(
            "null is not usable as an operand".into(),
        )),
    }
}

fn series_agg(
    s: &Series,
    f: impl FnOnce(Expr) -> Expr,
) -> Result<ScalarValue, SandboxError> {
    let name = s.name().clone();
    let frame = DataFrame::new(vec![s.clone().into_column()])?;
    let out = frame.lazy().select([f(col(name))]).collect()?;
    let series = single_series(&out)?;
    let av = series.get(0)?;
    Ok(any_to_scalar(&av))
}

fn single_series(df: &DataFrame) -> Result<Series, SandboxError> {
    df.get_columns()
        .first()
        .map(|c| c.as_materialized_series().clone())
        .ok_or_else(|| SandboxError::Execution("expression produced no columns".into()))
}

fn column_series(df: &DataFrame, name: &str) -> Result<Series, SandboxError> {
    df.column(name)
        .map(|c| c.as_materialized_series().clone())
        .map_err(|_| SandboxError::Execution(format!("Column '{name}' not found")))
}

/// Describe-style frame: one label column and one column of statistics per
/// numeric input column, mirroring the statistical summary tool.
fn describe_frame(df: &DataFrame) -> Result<DataFrame, SandboxError> {
    let numeric: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .collect();
    if numeric.is_empty() {
        return Err(SandboxError::Execution("No numeric columns found".into()));
    }

    let labels = Series::new(
        "statistic".into(),
        &["count", "mean", "std", "min", "25%", "50%", "75%", "max"],
    );
    let mut columns = vec![labels.into_column()];
    for column in numeric {
        let stats = column_stats(column.as_materialized_series());
        let values: Vec<Option<f64>> = vec![
            Some(stats.count as f64),
            stats.mean,
            stats.std,
            stats.min,
            stats.q1,
            stats.median,
            stats.q3,
            stats.max,
        ];
        columns.push(Series::new(column.name().clone(), values).into_column());
    }
    Ok(DataFrame::new(columns)?)
}

fn take_arg<'a>(
    args: &'a [Value],
    kwargs: &'a [(String, Value)],
    pos: usize,
    name: &str,
) -> Option<&'a Value> {
    kwargs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
        .or_else(|| args.get(pos))
}

fn arg_usize(
    args: &[Value],
    kwargs: &[(String, Value)],
    pos: usize,
    name: &str,
    default: usize,
) -> Result<usize, SandboxError> {
    match take_arg(args, kwargs, pos, name) {
        None => Ok(default),
        Some(Value::Scalar(ScalarValue::Int(v))) if *v >= 0 => Ok(*v as usize),
        Some(other) => Err(SandboxError::Execution(format!(
            "argument '{name}' must be a non-negative integer, got {}",
            other.kind()
        ))),
    }
}

fn arg_bool(
    args: &[Value],
    kwargs: &[(String, Value)],
    pos: usize,
    name: &str,
    default: bool,
) -> Result<bool, SandboxError> {
    match take_arg(args, kwargs, pos, name) {
        None => Ok(default),
        Some(Value::Scalar(ScalarValue::Bool(v))) => Ok(*v),
        Some(other) => Err(SandboxError::Execution(format!(
            "argument '{name}' must be a boolean, got {}",
            other.kind()
        ))),
    }
}

/// Column name(s) from a string scalar or a list of strings.
fn value_names(v: &Value) -> Result<Vec<String>, SandboxError> {
    match v {
        Value::Scalar(ScalarValue::Str(s)) => Ok(vec![s.clone()]),
        Value::List(items) => scalar_names(items),
        other => Err(SandboxError::Execution(format!(
            "expected a column name or list of column names, got {}",
            other.kind()
        ))),
    }
}

fn scalar_names(items: &[ScalarValue]) -> Result<Vec<String>, SandboxError> {
    items
        .iter()
        .map(|s| match s {
            ScalarValue::Str(name) => Ok(name.clone()),
            other => Err(SandboxError::Execution(format!(
                "expected a column name, got {other:?}"
            ))),
        })
        .collect()
}

fn plain_names(names: &[String]) -> Vec<PlSmallStr> {
    names.iter().map(PlSmallStr::from).collect()
}
