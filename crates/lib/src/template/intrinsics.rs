//! The subset of CloudFormation intrinsics image discovery relies on:
//! `Ref`, `Fn::Sub` and `Fn::Join`, in both short (`!Ref`) and long form.

use std::collections::BTreeMap;

use serde_yaml::Value;

const PSEUDO_PREFIX: &str = "AWS::";

/// Replace `${Name}` references with parameter values.
///
/// Pseudo parameters (`${AWS::Region}`) become `local-Region`; unknown names
/// are left untouched so callers can detect them.
pub fn substitute(input: &str, params: &BTreeMap<String, String>) -> String {
  let mut out = String::with_capacity(input.len());
  let mut rest = input;
  while let Some(start) = rest.find("${") {
    out.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    let Some(end) = after.find('}') else {
      out.push_str(&rest[start..]);
      return out;
    };
    let name = &after[..end];
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    match params.get(name) {
      Some(value) if valid => out.push_str(value),
      _ if valid && name.starts_with(PSEUDO_PREFIX) => {
        out.push_str("local-");
        out.push_str(&name[PSEUDO_PREFIX.len()..]);
      }
      _ => out.push_str(&rest[start..start + 2 + end + 1]),
    }
    rest = &after[end + 1..];
  }
  out.push_str(rest);
  out
}

fn resolve_ref(name: &str, params: &BTreeMap<String, String>) -> String {
  if let Some(value) = params.get(name) {
    return value.clone();
  }
  if let Some(rest) = name.strip_prefix(PSEUDO_PREFIX) {
    return format!("local-{}", rest);
  }
  name.to_string()
}

fn resolve_sub(arg: &Value, params: &BTreeMap<String, String>) -> Option<Value> {
  match arg {
    Value::String(template) => Some(Value::String(substitute(template, params))),
    Value::Sequence(items) if items.len() == 2 => {
      let template = items[0].as_str()?;
      let mut merged = params.clone();
      if let Value::Mapping(vars) = &items[1] {
        for (k, v) in vars {
          if let Some(key) = k.as_str() {
            merged.insert(key.to_string(), scalar_string(&resolve(v, params)).unwrap_or_default());
          }
        }
      }
      Some(Value::String(substitute(template, &merged)))
    }
    _ => None,
  }
}

fn resolve_join(arg: &Value, params: &BTreeMap<String, String>) -> Option<Value> {
  let Value::Sequence(items) = arg else {
    return None;
  };
  if items.len() != 2 {
    return None;
  }
  let sep = scalar_string(&resolve(&items[0], params)).unwrap_or_default();
  let Value::Sequence(elements) = &items[1] else {
    return None;
  };
  let parts: Vec<String> = elements
    .iter()
    .map(|e| scalar_string(&resolve(e, params)).unwrap_or_default())
    .collect();
  Some(Value::String(parts.join(&sep)))
}

fn apply(function: &str, arg: &Value, params: &BTreeMap<String, String>) -> Option<Value> {
  match function {
    "Ref" => scalar_string(&resolve(arg, params)).map(|name| Value::String(resolve_ref(&name, params))),
    "Fn::Sub" | "Sub" => resolve_sub(arg, params),
    "Fn::Join" | "Join" => resolve_join(arg, params),
    _ => None,
  }
}

/// Resolve supported intrinsics anywhere inside `node`.
pub(crate) fn resolve(node: &Value, params: &BTreeMap<String, String>) -> Value {
  match node {
    Value::String(s) => Value::String(substitute(s, params)),
    Value::Tagged(tagged) => {
      let tag = tagged.tag.to_string();
      let name = tag.trim_start_matches('!');
      apply(name, &tagged.value, params).unwrap_or_else(|| node.clone())
    }
    Value::Mapping(map) => {
      if map.len() == 1
        && let Some((k, v)) = map.iter().next()
        && let Some(function) = k.as_str()
        && let Some(resolved) = apply(function, v, params)
      {
        return resolved;
      }
      let mut out = serde_yaml::Mapping::new();
      for (k, v) in map {
        out.insert(k.clone(), resolve(v, params));
      }
      Value::Mapping(out)
    }
    Value::Sequence(items) => Value::Sequence(items.iter().map(|v| resolve(v, params)).collect()),
    other => other.clone(),
  }
}

/// Render a scalar as a string; `None` for null, mappings and sequences.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}
