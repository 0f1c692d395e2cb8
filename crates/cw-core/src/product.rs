//! Products
//!
//! Everything placed along a wall is a cage object sized by its `Dim X`,
//! `Dim Y` and `Dim Z` inputs. Cabinets additionally get a carcass of cut
//! parts whose sizes and positions follow the cage through bindings, so
//! resizing the cage and recalculating rebuilds the box.

use cw_cad::{Calculator, Expr, PropertyRef, Variable};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::scene::{ObjectTag, Scene, SceneResult};
use crate::settings::Settings;
use crate::units::inch;

/// Cabinet family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CabinetKind {
    Base,
    Tall,
    Upper,
}

/// Appliance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplianceKind {
    Range,
    Dishwasher,
    Refrigerator,
    Hood,
}

impl ApplianceKind {
    /// Catalog width, height, depth
    fn size(&self) -> (f32, f32, f32) {
        match self {
            ApplianceKind::Range => (inch(30.0), inch(36.0), inch(25.0)),
            ApplianceKind::Dishwasher => (inch(24.0), inch(34.0), inch(24.0)),
            ApplianceKind::Refrigerator => (inch(36.0), inch(70.0), inch(30.0)),
            ApplianceKind::Hood => (inch(30.0), inch(6.0), inch(20.0)),
        }
    }

    fn properties(&self) -> Vec<(&'static str, f32)> {
        match self {
            ApplianceKind::Range => vec![("Has Hood", 0.0), ("Hood Height", inch(24.0))],
            ApplianceKind::Dishwasher => vec![("Panel Ready", 0.0)],
            ApplianceKind::Refrigerator => vec![("Counter Depth", 0.0), ("Has Water Line", 1.0)],
            ApplianceKind::Hood => vec![("CFM Rating", 400.0)],
        }
    }
}

/// What kind of thing is being placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    Cabinet(CabinetKind),
    Appliance(ApplianceKind),
    Door,
    Window,
}

impl ProductKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProductKind::Cabinet(CabinetKind::Base) => "Base Cabinet",
            ProductKind::Cabinet(CabinetKind::Tall) => "Tall Cabinet",
            ProductKind::Cabinet(CabinetKind::Upper) => "Upper Cabinet",
            ProductKind::Appliance(ApplianceKind::Range) => "Range",
            ProductKind::Appliance(ApplianceKind::Dishwasher) => "Dishwasher",
            ProductKind::Appliance(ApplianceKind::Refrigerator) => "Refrigerator",
            ProductKind::Appliance(ApplianceKind::Hood) => "Hood",
            ProductKind::Door => "Door",
            ProductKind::Window => "Window",
        }
    }

    /// Classification tag carried next to [`ObjectTag::Cage`]
    pub fn tag(&self) -> ObjectTag {
        match self {
            ProductKind::Cabinet(_) => ObjectTag::Cabinet,
            ProductKind::Appliance(_) => ObjectTag::Appliance,
            ProductKind::Door => ObjectTag::Door,
            ProductKind::Window => ObjectTag::Window,
        }
    }

    /// Doors and windows cut through the wall and block both faces
    pub fn is_opening(&self) -> bool {
        matches!(self, ProductKind::Door | ProductKind::Window)
    }
}

/// Capability interface shared by every product kind
pub trait Product {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn depth(&self) -> f32;

    /// Create the cage object with its properties and parts
    fn create(&self, scene: &mut Scene, settings: &Settings) -> SceneResult<Uuid>;

    /// Add kind-specific properties and child parts to an existing cage
    fn add_properties(&self, scene: &mut Scene, id: Uuid, settings: &Settings) -> SceneResult<()>;
}

/// Product kind with its size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub kind: ProductKind,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl ProductSpec {
    pub fn new(kind: ProductKind, width: f32, height: f32, depth: f32) -> Self {
        Self {
            kind,
            width,
            height,
            depth,
        }
    }

    /// Default size for a kind
    pub fn from_settings(kind: ProductKind, settings: &Settings) -> Self {
        let cabinets = &settings.cabinets;
        let openings = &settings.openings;
        let (width, height, depth) = match kind {
            ProductKind::Cabinet(CabinetKind::Base) => (
                cabinets.default_width,
                cabinets.base_height,
                cabinets.base_depth,
            ),
            ProductKind::Cabinet(CabinetKind::Tall) => (
                cabinets.default_width,
                cabinets.tall_height,
                cabinets.tall_depth,
            ),
            ProductKind::Cabinet(CabinetKind::Upper) => (
                cabinets.default_width,
                cabinets.upper_height,
                cabinets.upper_depth,
            ),
            ProductKind::Appliance(ApplianceKind::Hood) => {
                let (width, height, depth) = ApplianceKind::Hood.size();
                // A hood runs from its mounting height up to the ceiling
                let to_ceiling = settings.wall_height - cabinets.hood_location_z;
                (width, to_ceiling.max(height), depth)
            }
            ProductKind::Appliance(appliance) => appliance.size(),
            ProductKind::Door => (
                openings.door_width,
                openings.door_height,
                settings.wall_thickness,
            ),
            ProductKind::Window => (
                openings.window_width,
                openings.window_height,
                settings.wall_thickness,
            ),
        };
        Self::new(kind, width, height, depth)
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Height of the product's bottom above the floor
    pub fn default_z(&self, settings: &Settings) -> f32 {
        match self.kind {
            ProductKind::Cabinet(CabinetKind::Upper) => settings.cabinets.upper_location_z,
            ProductKind::Appliance(ApplianceKind::Hood) => settings.cabinets.hood_location_z,
            ProductKind::Window => settings.openings.window_height_from_floor,
            _ => 0.0,
        }
    }

    /// Vertical extent occupied once placed at its default height
    pub fn z_range(&self, settings: &Settings) -> (f32, f32) {
        let z = self.default_z(settings);
        (z, z + self.height)
    }
}

impl Product for ProductSpec {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn depth(&self) -> f32 {
        self.depth
    }

    fn create(&self, scene: &mut Scene, settings: &Settings) -> SceneResult<Uuid> {
        let id = scene.create_parametric(
            self.kind.name(),
            [ObjectTag::Cage, self.kind.tag()],
            "Cage",
        )?;
        scene.set_input(id, "Dim X", self.width)?;
        scene.set_input(id, "Dim Y", self.depth)?;
        scene.set_input(id, "Dim Z", self.height)?;
        // Cabinets and appliances extend out of the wall toward -Y
        scene.set_input(id, "Mirror Y", !self.kind.is_opening())?;
        self.add_properties(scene, id, settings)?;
        debug!("Created {} {}", self.kind.name(), id);
        Ok(id)
    }

    fn add_properties(&self, scene: &mut Scene, id: Uuid, settings: &Settings) -> SceneResult<()> {
        match self.kind {
            ProductKind::Cabinet(kind) => build_carcass(scene, id, kind, settings),
            ProductKind::Appliance(kind) => {
                for (name, value) in kind.properties() {
                    scene.set_property(id, name, value)?;
                }
                Ok(())
            }
            ProductKind::Door | ProductKind::Window => scene.set_property(id, "Cut Wall", 1.0),
        }
    }
}

// ============== Carcass ==============

/// A carcass part and the formulas driving it
struct PartLayout {
    name: &'static str,
    formulas: &'static [(&'static str, &'static str)],
}

const BASE_TALL_PARTS: &[PartLayout] = &[
    PartLayout {
        name: "Left Side",
        formulas: &[
            ("inputs.Length", "dim_z"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Right Side",
        formulas: &[
            ("location.x", "dim_x"),
            ("inputs.Length", "dim_z"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Bottom",
        formulas: &[
            ("location.x", "mt"),
            ("location.z", "tkh"),
            ("inputs.Length", "dim_x-(mt*2)"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Back",
        formulas: &[
            ("location.x", "mt"),
            ("location.z", "tkh+mt"),
            ("inputs.Length", "dim_z-tkh-(mt*2)"),
            ("inputs.Width", "dim_x-(mt*2)"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Toe Kick",
        formulas: &[
            ("location.x", "mt"),
            ("location.y", "-dim_y+tks"),
            ("inputs.Length", "dim_x-(mt*2)"),
            ("inputs.Width", "tkh"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Top",
        formulas: &[
            ("location.x", "mt"),
            ("location.z", "dim_z"),
            ("inputs.Length", "dim_x-(mt*2)"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
];

const UPPER_PARTS: &[PartLayout] = &[
    PartLayout {
        name: "Left Side",
        formulas: &[
            ("inputs.Length", "dim_z"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Right Side",
        formulas: &[
            ("location.x", "dim_x"),
            ("inputs.Length", "dim_z"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Bottom",
        formulas: &[
            ("location.x", "mt"),
            ("inputs.Length", "dim_x-(mt*2)"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Back",
        formulas: &[
            ("location.x", "mt"),
            ("location.z", "mt"),
            ("inputs.Length", "dim_z-(mt*2)"),
            ("inputs.Width", "dim_x-(mt*2)"),
            ("inputs.Thickness", "mt"),
        ],
    },
    PartLayout {
        name: "Top",
        formulas: &[
            ("location.x", "mt"),
            ("location.z", "dim_z"),
            ("inputs.Length", "dim_x-(mt*2)"),
            ("inputs.Width", "dim_y"),
            ("inputs.Thickness", "mt"),
        ],
    },
];

const BASE_TALL_BAY: &[(&str, &str)] = &[
    ("location.x", "mt"),
    ("location.y", "-dim_y"),
    ("location.z", "tkh+mt"),
    ("inputs.Dim X", "dim_x-(mt*2)"),
    ("inputs.Dim Y", "dim_y-mt"),
    ("inputs.Dim Z", "dim_z-tkh-(mt*2)"),
];

const UPPER_BAY: &[(&str, &str)] = &[
    ("location.x", "mt"),
    ("location.y", "-dim_y"),
    ("location.z", "mt"),
    ("inputs.Dim X", "dim_x-(mt*2)"),
    ("inputs.Dim Y", "dim_y-mt"),
    ("inputs.Dim Z", "dim_z-(mt*2)"),
];

/// Calculator splitting a tall cabinet's opening into stacked bays
pub const TALL_BAY_CALCULATOR: &str = "Bay Heights";

/// Bind `target = formula`, declaring only the variables the formula uses
fn bind_formula(
    scene: &mut Scene,
    target: PropertyRef,
    formula: &str,
    variables: &[(&str, PropertyRef)],
) -> SceneResult<()> {
    let expr = Expr::parse(formula)?;
    let used = expr.variables();
    let declared = variables
        .iter()
        .filter(|(name, _)| used.contains(name))
        .map(|(name, source)| Variable::new(*name, source.clone()))
        .collect();
    scene.bind(target, formula, declared)?;
    Ok(())
}

fn build_carcass(
    scene: &mut Scene,
    cage: Uuid,
    kind: CabinetKind,
    settings: &Settings,
) -> SceneResult<()> {
    let cabinets = &settings.cabinets;
    scene.set_property(cage, "Material Thickness", cabinets.material_thickness)?;
    if kind != CabinetKind::Upper {
        scene.set_property(cage, "Toe Kick Height", cabinets.toe_kick_height)?;
        scene.set_property(cage, "Toe Kick Setback", cabinets.toe_kick_setback)?;
    }

    let variables = [
        ("dim_x", PropertyRef::input(cage, "Dim X")),
        ("dim_y", PropertyRef::input(cage, "Dim Y")),
        ("dim_z", PropertyRef::input(cage, "Dim Z")),
        ("mt", PropertyRef::prop(cage, "Material Thickness")),
        ("tkh", PropertyRef::prop(cage, "Toe Kick Height")),
        ("tks", PropertyRef::prop(cage, "Toe Kick Setback")),
    ];

    let (parts, bay_formulas) = match kind {
        CabinetKind::Upper => (UPPER_PARTS, UPPER_BAY),
        CabinetKind::Base | CabinetKind::Tall => (BASE_TALL_PARTS, BASE_TALL_BAY),
    };

    for layout in parts {
        let part = scene.create_parametric(layout.name, ObjectTag::Part, "CutPart")?;
        scene.set_parent(part, Some(cage), false)?;
        scene.set_input(part, "Mirror Y", true)?;
        for (path, formula) in layout.formulas {
            bind_formula(scene, PropertyRef::new(part, *path), formula, &variables)?;
        }
    }

    let bay = scene.create_parametric("Bay", ObjectTag::Part, "Cage")?;
    scene.set_parent(bay, Some(cage), false)?;
    for (path, formula) in bay_formulas {
        bind_formula(scene, PropertyRef::new(bay, *path), formula, &variables)?;
    }

    if kind == CabinetKind::Tall {
        scene.add_calculator(
            bay,
            Calculator::new(TALL_BAY_CALCULATOR, 0.0)
                .with_prompt("Upper Bay")
                .with_prompt("Lower Bay"),
        )?;
        scene.bind(
            PropertyRef::new(bay, format!("calc.{}.total", TALL_BAY_CALCULATOR)),
            "dim_z",
            vec![Variable::new("dim_z", PropertyRef::input(bay, "Dim Z"))],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn child(scene: &Scene, parent: Uuid, name: &str) -> Uuid {
        scene
            .children(parent)
            .iter()
            .copied()
            .find(|c| scene.get(*c).unwrap().name == name)
            .unwrap()
    }

    #[test]
    fn test_from_settings_defaults() {
        let settings = Settings::default();
        let base = ProductSpec::from_settings(ProductKind::Cabinet(CabinetKind::Base), &settings);
        assert_relative_eq!(base.width, inch(18.0));
        assert_relative_eq!(base.height, inch(34.5));
        assert_eq!(base.default_z(&settings), 0.0);

        let upper = ProductSpec::from_settings(ProductKind::Cabinet(CabinetKind::Upper), &settings);
        assert_relative_eq!(upper.default_z(&settings), inch(54.0));

        let door = ProductSpec::from_settings(ProductKind::Door, &settings);
        assert_relative_eq!(door.depth, settings.wall_thickness);

        let window = ProductSpec::from_settings(ProductKind::Window, &settings);
        assert_relative_eq!(window.default_z(&settings), inch(36.0));
    }

    #[test]
    fn test_hood_reaches_ceiling() {
        let settings = Settings::default();
        let hood = ProductSpec::from_settings(ProductKind::Appliance(ApplianceKind::Hood), &settings);
        assert_relative_eq!(hood.default_z(&settings), inch(54.0));
        assert_relative_eq!(hood.height, inch(42.0), epsilon = 1e-5);
    }

    #[test]
    fn test_base_carcass_follows_cage() {
        let settings = Settings::default();
        let mut scene = Scene::new();
        let spec = ProductSpec::from_settings(ProductKind::Cabinet(CabinetKind::Base), &settings);
        let cab = spec.create(&mut scene, &settings).unwrap();
        assert!(scene.has_tag(cab, ObjectTag::Cabinet));
        assert!(scene.has_tag(cab, ObjectTag::Cage));

        scene.set_input(cab, "Dim X", inch(30.0)).unwrap();
        let report = scene.recalculate().unwrap();
        assert!(report.is_clean());

        let mt = settings.cabinets.material_thickness;
        let tkh = settings.cabinets.toe_kick_height;
        let bottom = child(&scene, cab, "Bottom");
        assert_relative_eq!(
            scene.input(bottom, "Length").unwrap(),
            inch(30.0) - mt * 2.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            scene.get(bottom).unwrap().transform.location.z,
            tkh,
            epsilon = 1e-6
        );

        let right = child(&scene, cab, "Right Side");
        assert_relative_eq!(
            scene.get(right).unwrap().transform.location.x,
            inch(30.0),
            epsilon = 1e-6
        );

        let toe_kick = child(&scene, cab, "Toe Kick");
        assert_relative_eq!(
            scene.get(toe_kick).unwrap().transform.location.y,
            -inch(24.0) + settings.cabinets.toe_kick_setback,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_upper_has_no_toe_kick() {
        let settings = Settings::default();
        let mut scene = Scene::new();
        let spec = ProductSpec::from_settings(ProductKind::Cabinet(CabinetKind::Upper), &settings);
        let cab = spec.create(&mut scene, &settings).unwrap();
        let report = scene.recalculate().unwrap();
        assert!(report.is_clean());

        let names: Vec<&str> = scene
            .children(cab)
            .iter()
            .map(|c| scene.get(*c).unwrap().name.as_str())
            .collect();
        assert!(!names.contains(&"Toe Kick"));
        assert_eq!(scene.property(cab, "Toe Kick Height"), None);

        let back = child(&scene, cab, "Back");
        let mt = settings.cabinets.material_thickness;
        assert_relative_eq!(
            scene.input(back, "Length").unwrap(),
            inch(30.0) - mt * 2.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_tall_bay_calculator_tracks_opening() {
        let settings = Settings::default();
        let mut scene = Scene::new();
        let spec = ProductSpec::from_settings(ProductKind::Cabinet(CabinetKind::Tall), &settings);
        let cab = spec.create(&mut scene, &settings).unwrap();
        scene.recalculate().unwrap();

        let bay = child(&scene, cab, "Bay");
        let bay_height = scene.input(bay, "Dim Z").unwrap();
        let calc = scene.get(bay).unwrap().calculator(TALL_BAY_CALCULATOR).unwrap();
        assert_relative_eq!(calc.total(), bay_height, epsilon = 1e-6);
        assert_relative_eq!(calc.value("Upper Bay").unwrap(), bay_height / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_openings_and_appliances() {
        let settings = Settings::default();
        let mut scene = Scene::new();
        let door = ProductSpec::from_settings(ProductKind::Door, &settings)
            .create(&mut scene, &settings)
            .unwrap();
        assert_eq!(scene.property(door, "Cut Wall"), Some(1.0));
        assert!(scene.children(door).is_empty());

        let fridge = ProductSpec::from_settings(
            ProductKind::Appliance(ApplianceKind::Refrigerator),
            &settings,
        )
        .create(&mut scene, &settings)
        .unwrap();
        assert_eq!(scene.property(fridge, "Has Water Line"), Some(1.0));
        assert!(scene.has_tag(fridge, ObjectTag::Appliance));
    }
}
