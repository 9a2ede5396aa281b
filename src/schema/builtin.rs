//! Built-in section definitions for thin-film solar cell and electrochemistry labs.

use super::{DType, FieldDef, FieldKind, SectionDef, SectionRole};

fn text(name: &str) -> FieldDef {
    quantity(name, DType::Str, None)
}

fn float(name: &str, unit: &str) -> FieldDef {
    quantity(name, DType::Float, Some(unit))
}

fn series(name: &str, unit: &str) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        kind: FieldKind::Quantity {
            dtype: DType::Float,
            unit: Some(unit.to_string()),
            array: true,
        },
    }
}

fn quantity(name: &str, dtype: DType, unit: Option<&str>) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        kind: FieldKind::Quantity {
            dtype,
            unit: unit.map(str::to_string),
            array: false,
        },
    }
}

fn sub(name: &str, section: &str) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        kind: FieldKind::SubSection {
            section: section.to_string(),
            repeats: false,
            placeholder: false,
        },
    }
}

fn repeated(name: &str, section: &str) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        kind: FieldKind::SubSection {
            section: section.to_string(),
            repeats: true,
            placeholder: false,
        },
    }
}

fn placeholder(name: &str, section: &str) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        kind: FieldKind::SubSection {
            section: section.to_string(),
            repeats: false,
            placeholder: true,
        },
    }
}

fn reference(name: &str, section: &str) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        kind: FieldKind::Reference {
            section: section.to_string(),
        },
    }
}

fn def(name: &str, extends: Option<&str>, fields: Vec<FieldDef>) -> SectionDef {
    SectionDef {
        name: name.to_string(),
        extends: extends.map(str::to_string),
        role: SectionRole::Plain,
        fields,
    }
}

fn with_role(mut def: SectionDef, role: SectionRole) -> SectionDef {
    def.role = role;
    def
}

pub(super) fn definitions() -> Vec<SectionDef> {
    vec![
        // processes
        def(
            "Process",
            None,
            vec![
                text("name"),
                quantity("datetime", DType::Datetime, None),
                text("description"),
                text("lab_id"),
                text("method"),
                text("function"),
                text("location"),
                quantity("present", DType::Bool, None),
                quantity("position_in_experimental_plan", DType::Int, None),
                quantity("is_standard_process", DType::Bool, None),
                repeated("samples", "CompositeSystemReference"),
                reference("batch", "SolarCellBatch"),
                reference("previous_process", "Process"),
            ],
        ),
        def(
            "LayerProperties",
            None,
            vec![
                text("layer_type"),
                text("layer_material_name"),
                text("layer_material"),
            ],
        ),
        def(
            "LayerDeposition",
            Some("Process"),
            vec![repeated("layer", "LayerProperties")],
        ),
        def(
            "WetChemicalDeposition",
            Some("LayerDeposition"),
            vec![
                repeated("solution", "PrecursorSolution"),
                sub("annealing", "Annealing"),
                sub("quenching", "Quenching"),
            ],
        ),
        def(
            "SpinCoatingRecipeSteps",
            None,
            vec![
                float("speed", "rpm"),
                float("time", "s"),
                float("acceleration", "rpm/s"),
            ],
        ),
        def(
            "SpinCoating",
            Some("WetChemicalDeposition"),
            vec![repeated("recipe_steps", "SpinCoatingRecipeSteps")],
        ),
        def(
            "SlotDieCoatingProperties",
            None,
            vec![
                float("flow_rate", "ul/minute"),
                float("slot_die_head_distance_to_thinfilm", "mm"),
                float("slot_die_head_speed", "mm/s"),
                float("coating_run_time", "s"),
            ],
        ),
        def(
            "SlotDieCoating",
            Some("WetChemicalDeposition"),
            vec![sub("properties", "SlotDieCoatingProperties")],
        ),
        def(
            "EvaporationSource",
            None,
            vec![
                reference("chemical", "Chemical"),
                float("thickness", "nm"),
                float("start_rate", "angstrom/s"),
                float("target_rate", "angstrom/s"),
                float("temperature", "°C"),
            ],
        ),
        def(
            "Evaporation",
            Some("LayerDeposition"),
            vec![
                repeated("evaporation_source", "EvaporationSource"),
                float("pressure", "mbar"),
                float("substrate_temperature", "°C"),
            ],
        ),
        def(
            "Annealing",
            None,
            vec![
                float("temperature", "°C"),
                float("time", "s"),
                text("atmosphere"),
                float("ramp", "K/minute"),
            ],
        ),
        def("Quenching", None, vec![]),
        def(
            "AntiSolventQuenching",
            Some("Quenching"),
            vec![
                text("name"),
                reference("anti_solvent", "Chemical"),
                placeholder("anti_solvent_2", "PubChemPureSubstanceSection"),
                float("anti_solvent_volume", "ml"),
                float("anti_solvent_dropping_time", "s"),
            ],
        ),
        def("SpinCoatingAntiSolvent", Some("AntiSolventQuenching"), vec![]),
        def("GasQuenching", Some("Quenching"), vec![text("gas")]),
        def(
            "AirKnifeGasQuenching",
            Some("GasQuenching"),
            vec![
                float("air_knife_pressure", "mbar"),
                float("air_knife_speed", "mm/s"),
                float("air_knife_angle", "degree"),
                float("air_knife_distance_to_thin_film", "um"),
            ],
        ),
        def("SpinCoatingGasQuenching", Some("GasQuenching"), vec![]),
        // solutions and chemicals
        with_role(
            def(
                "PrecursorSolution",
                None,
                vec![
                    text("name"),
                    reference("solution", "Solution"),
                    float("solution_volume", "ml"),
                    sub("solution_details", "Solution"),
                ],
            ),
            SectionRole::SolutionHolder,
        ),
        def(
            "Solution",
            None,
            vec![
                text("name"),
                text("lab_id"),
                text("description"),
                repeated("solute", "SolutionChemical"),
                repeated("solvent", "SolutionChemical"),
                repeated("additive", "SolutionChemical"),
            ],
        ),
        def(
            "SolutionChemical",
            None,
            vec![
                reference("chemical", "Chemical"),
                placeholder("chemical_2", "PubChemPureSubstanceSection"),
                float("chemical_volume", "ml"),
                float("chemical_mass", "mg"),
                float("concentration_mass", "mg/ml"),
                float("concentration_mol", "mol/l"),
                quantity("amount_relative", DType::Float, None),
            ],
        ),
        with_role(
            def(
                "PubChemPureSubstanceSection",
                None,
                vec![
                    text("name"),
                    text("molecular_formula"),
                    quantity("pub_chem_cid", DType::Int, None),
                    text("iupac_name"),
                    text("cas_number"),
                    text("smile"),
                    text("inchi_key"),
                    float("molar_mass", "g/mol"),
                    quantity("load_data", DType::Bool, None),
                ],
            ),
            SectionRole::PureSubstance,
        ),
        def(
            "Chemical",
            None,
            vec![text("name"), text("lab_id"), text("supplier")],
        ),
        // samples and batches
        def(
            "ReadableIdentifiers",
            None,
            vec![
                text("institute"),
                text("owner"),
                quantity("datetime", DType::Datetime, None),
                text("short_name"),
                text("lab_id"),
            ],
        ),
        def(
            "CompositeSystemReference",
            None,
            vec![
                reference("reference", "CompositeSystem"),
                text("lab_id"),
                text("name"),
            ],
        ),
        def(
            "CompositeSystem",
            None,
            vec![
                text("name"),
                quantity("datetime", DType::Datetime, None),
                text("description"),
                text("lab_id"),
            ],
        ),
        def(
            "Substrate",
            Some("CompositeSystem"),
            vec![
                text("substrate"),
                text("conducting_material"),
                float("solar_cell_area", "cm^2"),
            ],
        ),
        def(
            "SolarCellProperties",
            None,
            vec![reference("substrate", "Substrate"), text("architecture")],
        ),
        def(
            "SolarCellSample",
            Some("CompositeSystem"),
            vec![
                sub("sample_id", "ReadableIdentifiers"),
                reference("substrate", "Substrate"),
                text("architecture"),
            ],
        ),
        def(
            "SolarCellBatch",
            Some("CompositeSystem"),
            vec![
                sub("batch_id", "ReadableIdentifiers"),
                repeated("entities", "CompositeSystemReference"),
            ],
        ),
        // measurements
        def(
            "Measurement",
            None,
            vec![
                text("name"),
                quantity("datetime", DType::Datetime, None),
                text("description"),
                text("lab_id"),
                text("method"),
                repeated("samples", "CompositeSystemReference"),
                text("data_file"),
            ],
        ),
        def(
            "VoltammetryCycle",
            None,
            vec![
                series("time", "s"),
                series("current", "mA"),
                series("voltage", "V"),
                series("control", "V"),
                series("charge", "mC"),
                series("current_density", "mA/cm^2"),
            ],
        ),
        def(
            "PotentiostatSetup",
            None,
            vec![
                float("flow_cell_pump_rate", "mL/minute"),
                float("flow_cell_pressure", "bar"),
                float("rotation_speed", "rpm"),
            ],
        ),
        def(
            "PotentiostatMeasurement",
            Some("Measurement"),
            vec![
                text("station"),
                reference("environment", "Environment"),
                reference("setup", "ElectroChemicalSetup"),
                sub("pretreatment", "VoltammetryCycle"),
                sub("setup_parameters", "PotentiostatSetup"),
            ],
        ),
        def(
            "PLProperties",
            None,
            vec![
                float("wavelength_start", "nm"),
                float("wavelength_stop", "nm"),
                float("wavelength_step_size", "nm"),
                float("integration_time", "ms"),
                float("temperature", "°C"),
                quantity("number_of_averages", DType::Float, None),
                text("lamp"),
            ],
        ),
        def(
            "PLData",
            None,
            vec![
                series("wavelength", "nm"),
                FieldDef {
                    name: "intensity".to_string(),
                    kind: FieldKind::Quantity {
                        dtype: DType::Float,
                        unit: None,
                        array: true,
                    },
                },
            ],
        ),
        def(
            "PLMeasurement",
            Some("Measurement"),
            vec![
                text("instrument"),
                sub("properties", "PLProperties"),
                sub("data", "PLData"),
            ],
        ),
        def(
            "ElectrolyserLog",
            Some("Measurement"),
            vec![
                series("time", "s"),
                series("h2_flow", "ml/minute"),
                series("o2_flow", "ml/minute"),
                series("anode_in", "°C"),
                series("cathode_in", "°C"),
                series("anode_out", "°C"),
                series("cathode_out", "°C"),
                series("ambient", "°C"),
                series("electrolyser_cell_anode", "°C"),
                series("electrolyser_cell_cathode", "°C"),
                FieldDef {
                    name: "timestamp".to_string(),
                    kind: FieldKind::Quantity {
                        dtype: DType::Datetime,
                        unit: None,
                        array: true,
                    },
                },
            ],
        ),
    ]
}
