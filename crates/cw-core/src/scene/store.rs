//! Property paths understood by the scene
//!
//! - `location.x|y|z`, `rotation.z`
//! - `inputs.<name>`: modifier input
//! - `props.<name>`: custom numeric property
//! - `calc.<calculator>.total` (read/write) and `calc.<calculator>.<prompt>` (read)

use cw_cad::{PropertyRef, PropertyStore};

use super::Scene;

enum Path<'a> {
    Location(usize),
    RotationZ,
    Input(&'a str),
    Prop(&'a str),
    CalcTotal(&'a str),
    CalcPrompt(&'a str, &'a str),
}

fn parse_path(path: &str) -> Option<Path<'_>> {
    let (head, rest) = path.split_once('.')?;
    match head {
        "location" => match rest {
            "x" => Some(Path::Location(0)),
            "y" => Some(Path::Location(1)),
            "z" => Some(Path::Location(2)),
            _ => None,
        },
        "rotation" if rest == "z" => Some(Path::RotationZ),
        "inputs" => Some(Path::Input(rest)),
        "props" => Some(Path::Prop(rest)),
        "calc" => {
            let (calc, prompt) = rest.split_once('.')?;
            if prompt == "total" {
                Some(Path::CalcTotal(calc))
            } else {
                Some(Path::CalcPrompt(calc, prompt))
            }
        }
        _ => None,
    }
}

impl PropertyStore for Scene {
    fn get_property(&self, property: &PropertyRef) -> Option<f32> {
        let object = self.get(property.object)?;
        match parse_path(&property.path)? {
            Path::Location(axis) => Some(object.transform.location[axis]),
            Path::RotationZ => Some(object.transform.rotation_z),
            Path::Input(name) => object.input(name),
            Path::Prop(name) => object.properties.get(name).copied(),
            Path::CalcTotal(calc) => object.calculator(calc).map(|c| c.total()),
            Path::CalcPrompt(calc, prompt) => object.calculator(calc)?.value(prompt),
        }
    }

    fn set_property(&mut self, property: &PropertyRef, value: f32) -> bool {
        let Some(path) = parse_path(&property.path) else {
            return false;
        };
        let Some(object) = self.get_mut(property.object) else {
            return false;
        };
        match path {
            Path::Location(axis) => {
                object.transform.location[axis] = value;
                true
            }
            Path::RotationZ => {
                object.transform.rotation_z = value;
                true
            }
            Path::Input(name) => object
                .modifier
                .as_mut()
                .is_some_and(|m| m.set_float(name, value).is_ok()),
            Path::Prop(name) => {
                object.properties.insert(name.to_string(), value);
                true
            }
            Path::CalcTotal(calc) => match object.calculator_mut(calc) {
                Some(calculator) => {
                    calculator.set_total(value);
                    true
                }
                None => false,
            },
            // Prompt values are derived from the total
            Path::CalcPrompt(..) => false,
        }
    }

    fn implicit_sources(&self, property: &PropertyRef) -> Vec<PropertyRef> {
        match parse_path(&property.path) {
            Some(Path::CalcPrompt(calc, _)) => vec![PropertyRef::new(
                property.object,
                format!("calc.{}.total", calc),
            )],
            _ => Vec::new(),
        }
    }
}
