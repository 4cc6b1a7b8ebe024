// Host-facing entry points with positional argument resolution.
//
// `to_binary` takes the values to pack followed by optional trailing
// settings, read from the end of the argument list:
//
//     to_binary(v1, v2, ..., [algorithm | false | true], [level])
//
// A trailing number is the level. Before it, a string names the algorithm;
// a boolean `false` selects no compression and `true` keeps the default.
// Everything earlier is packed. `from_binary` accepts the same algorithm
// argument in second position.

use crate::compress::{self, Algorithm, CompressError, PackOptions};
use crate::error::Result;
use crate::value::{Value, exact_integer};

/// Trailing settings split off an argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArgs<'a> {
    pub values: &'a [Value],
    pub algorithm: Algorithm,
    pub level: i32,
}

/// Split `args` into values and trailing algorithm/level settings.
pub fn resolve_pack_args(args: &[Value]) -> Result<ResolvedArgs<'_>, CompressError> {
    let mut values = args;
    let mut level = compress::DEFAULT_LEVEL;
    let mut algorithm = Algorithm::default();

    if let Some((last, rest)) = values.split_last()
        && let Some(n) = level_arg(last)
    {
        level = n;
        values = rest;
    }
    if let Some((last, rest)) = values.split_last()
        && let Some(selected) = algorithm_arg(last)
    {
        algorithm = selected?;
        values = rest;
    }

    Ok(ResolvedArgs {
        values,
        algorithm,
        level,
    })
}

/// Pack `args` after resolving trailing settings.
///
/// ```
/// use lbin::{Value, binding};
///
/// let packed = binding::to_binary(&[Value::Integer(7), Value::Boolean(false)]).unwrap();
/// assert_eq!(packed, [0x0A, 0x07]);
/// ```
pub fn to_binary(args: &[Value]) -> Result<Vec<u8>> {
    to_binary_with(args, &PackOptions::default())
}

/// Like `to_binary`, taking hooks and depth from `base`. The algorithm and
/// level still come from the arguments.
pub fn to_binary_with(args: &[Value], base: &PackOptions) -> Result<Vec<u8>> {
    let resolved = resolve_pack_args(args)?;
    let opts = base
        .clone()
        .with_algorithm(resolved.algorithm)
        .with_level(resolved.level);
    compress::pack_with(resolved.values, &opts)
}

/// Unpack `data`, returning the number of values alongside them.
///
/// `algorithm` has the same meaning as the algorithm argument of
/// `to_binary`; any other value kind, or `None`, selects the default.
pub fn from_binary(data: &[u8], algorithm: Option<&Value>) -> Result<(usize, Vec<Value>)> {
    from_binary_with(data, algorithm, &PackOptions::default())
}

pub fn from_binary_with(
    data: &[u8],
    algorithm: Option<&Value>,
    base: &PackOptions,
) -> Result<(usize, Vec<Value>)> {
    let algorithm = match algorithm.and_then(algorithm_arg) {
        Some(selected) => selected?,
        None => Algorithm::default(),
    };
    let values = compress::unpack_with(data, &base.clone().with_algorithm(algorithm))?;
    Ok((values.len(), values))
}

/// Interpret a number argument as a level.
///
/// Integral reals convert exactly; other reals read as 0, the host's
/// integer conversion result for them. Out-of-range integers saturate.
fn level_arg(arg: &Value) -> Option<i32> {
    let n = match *arg {
        Value::Integer(n) => n,
        Value::Real(r) => exact_integer(r).unwrap_or(0),
        _ => return None,
    };
    Some(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Interpret a string or boolean argument as an algorithm selection.
fn algorithm_arg(arg: &Value) -> Option<Result<Algorithm, CompressError>> {
    match arg {
        Value::String(name) => Some(String::from_utf8_lossy(name).parse()),
        Value::Boolean(false) => Some(Ok(Algorithm::None)),
        Value::Boolean(true) => {
            log::warn!("compression flag `true` keeps the default algorithm");
            Some(Ok(Algorithm::default()))
        }
        _ => None,
    }
}
