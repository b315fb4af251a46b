//! SAM / CloudFormation template parser.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::intrinsics::{resolve, scalar_string};
use super::{ImageFunction, TemplateError, TemplateParameter, TemplateParser};

const SERVERLESS_FUNCTION: &str = "AWS::Serverless::Function";
const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";

/// Reads SAM-style YAML from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct SamTemplateParser;

impl SamTemplateParser {
  fn load(&self, path: &Path) -> Result<Mapping, TemplateError> {
    let content = fs::read_to_string(path).map_err(|source| TemplateError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    parse_document(path, &content)
  }
}

fn parse_document(path: &Path, content: &str) -> Result<Mapping, TemplateError> {
  let value: Value = serde_yaml::from_str(content).map_err(|source| TemplateError::Decode {
    path: path.to_path_buf(),
    source,
  })?;
  match value {
    Value::Mapping(map) => Ok(map),
    Value::Null => Ok(Mapping::new()),
    _ => Err(TemplateError::NotAMapping {
      path: path.to_path_buf(),
    }),
  }
}

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
  map.get(key)
}

fn get_map<'a>(map: &'a Mapping, key: &str) -> Option<&'a Mapping> {
  get(map, key).and_then(Value::as_mapping)
}

fn get_str(map: &Mapping, key: &str) -> String {
  get(map, key).and_then(scalar_string).unwrap_or_default()
}

fn extract_parameters(doc: &Mapping) -> BTreeMap<String, TemplateParameter> {
  let mut out = BTreeMap::new();
  let Some(params) = get_map(doc, "Parameters") else {
    return out;
  };
  for (name, decl) in params {
    let (Some(name), Some(decl)) = (name.as_str(), decl.as_mapping()) else {
      continue;
    };
    if decl.is_empty() {
      continue;
    }
    let mut allowed: Vec<String> = Vec::new();
    if let Some(Value::Sequence(items)) = get(decl, "AllowedValues") {
      for item in items {
        let value = scalar_string(item).unwrap_or_default().trim().to_string();
        if !allowed.contains(&value) {
          allowed.push(value);
        }
      }
    }
    out.insert(
      name.to_string(),
      TemplateParameter {
        name: name.to_string(),
        kind: get_str(decl, "Type"),
        description: get_str(decl, "Description"),
        default: get(decl, "Default").and_then(scalar_string),
        allowed,
      },
    );
  }
  out
}

fn resolved_string(props: &Mapping, key: &str, params: &BTreeMap<String, String>) -> String {
  get(props, key)
    .map(|v| resolve(v, params))
    .as_ref()
    .and_then(scalar_string)
    .unwrap_or_default()
    .trim()
    .to_string()
}

fn check_image_uri(
  function: &str,
  logical_id: &str,
  field: &'static str,
  uri: String,
) -> Result<ImageFunction, TemplateError> {
  if uri.is_empty() {
    return Err(TemplateError::ImageUriRequired {
      function: function.to_string(),
      logical_id: logical_id.to_string(),
      field,
    });
  }
  if uri.contains("${") {
    return Err(TemplateError::UnresolvedImageUri {
      function: function.to_string(),
      logical_id: logical_id.to_string(),
      field,
      uri,
    });
  }
  Ok(ImageFunction {
    logical_id: logical_id.to_string(),
    name: function.to_string(),
    image_source: uri,
  })
}

fn function_name(props: &Mapping, logical_id: &str, params: &BTreeMap<String, String>) -> String {
  let name = resolved_string(props, "FunctionName", params);
  if name.is_empty() { logical_id.to_string() } else { name }
}

fn serverless_image_function(
  logical_id: &str,
  props: &Mapping,
  params: &BTreeMap<String, String>,
) -> Result<Option<ImageFunction>, TemplateError> {
  let package_type = resolved_string(props, "PackageType", params);
  let uri = resolved_string(props, "ImageUri", params);
  if !package_type.eq_ignore_ascii_case("Image") && uri.is_empty() {
    return Ok(None);
  }
  let name = function_name(props, logical_id, params);
  check_image_uri(&name, logical_id, "ImageUri", uri).map(Some)
}

fn lambda_image_function(
  logical_id: &str,
  props: &Mapping,
  params: &BTreeMap<String, String>,
) -> Result<Option<ImageFunction>, TemplateError> {
  let package_type = resolved_string(props, "PackageType", params);
  let uri = get_map(props, "Code")
    .map(|code| resolved_string(code, "ImageUri", params))
    .unwrap_or_default();
  if !package_type.eq_ignore_ascii_case("Image") && uri.is_empty() {
    return Ok(None);
  }
  let name = function_name(props, logical_id, params);
  check_image_uri(&name, logical_id, "Code.ImageUri", uri).map(Some)
}

fn extract_image_functions(
  doc: &Mapping,
  values: &BTreeMap<String, String>,
) -> Result<Vec<ImageFunction>, TemplateError> {
  let mut params: BTreeMap<String, String> = extract_parameters(doc)
    .into_values()
    .filter_map(|p| p.default.map(|d| (p.name, d)))
    .collect();
  params.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));

  let mut functions = Vec::new();
  let Some(resources) = get_map(doc, "Resources") else {
    return Ok(functions);
  };
  for (logical_id, resource) in resources {
    let (Some(logical_id), Some(resource)) = (logical_id.as_str(), resource.as_mapping()) else {
      continue;
    };
    let Some(props) = get_map(resource, "Properties") else {
      continue;
    };
    let found = match get_str(resource, "Type").as_str() {
      SERVERLESS_FUNCTION => serverless_image_function(logical_id, props, &params)?,
      LAMBDA_FUNCTION => lambda_image_function(logical_id, props, &params)?,
      _ => None,
    };
    if let Some(function) = found {
      debug!(function = %function.name, image = %function.image_source, "found image function");
      functions.push(function);
    }
  }
  functions.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(functions)
}

impl TemplateParser for SamTemplateParser {
  fn parameters(&self, path: &Path) -> Result<BTreeMap<String, TemplateParameter>, TemplateError> {
    let doc = self.load(path)?;
    Ok(extract_parameters(&doc))
  }

  fn image_functions(&self, path: &Path, values: &BTreeMap<String, String>) -> Result<Vec<ImageFunction>, TemplateError> {
    let doc = self.load(path)?;
    extract_image_functions(&doc, values)
  }
}
