// [libs/domain/source/src/scanner.rs]
/*!
 * =================================================================
 * APARATO: STRUCTURAL PROGRAM SCANNER (V4.3 - GOLD MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ESCANEO ESTRUCTURAL DEL PROGRAMA DE SIMULACIÓN
 *
 * # Alcance:
 * Escaneo de forma, no interpretación: llaves balanceadas (ignorando
 * literales de cadena y comentarios '#'), cabeceras 'simulation',
 * referencias 'config.*' / 'external.*' y límites 'steps.low/high'.
 * =================================================================
 */

use crate::errors::SourceFault;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static SIMULATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*simulation\s+(?:"(?P<quoted>[^"]+)"|(?P<bare>[A-Za-z_][A-Za-z0-9_.]*))\s*\{"#)
        .expect("static simulation header pattern")
});

static CONFIG_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bconfig\.(?P<name>[A-Za-z_][A-Za-z0-9_.]*)").expect("static config pattern")
});

static EXTERNAL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bexternal\.(?P<name>[A-Za-z_][A-Za-z0-9_.]*)").expect("static external pattern")
});

static STEP_BOUND_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bsteps\.(?P<edge>low|high)\s*=\s*(?P<value>-?[0-9]+)")
        .expect("static step bound pattern")
});

/// Bloque 'simulation' localizado dentro del programa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationBlock {
    pub simulation_name: String,
    pub block_body: String,
}

/// Límites de paso declarados por la simulación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBounds {
    pub low_step: i64,
    pub high_step: i64,
}

impl StepBounds {
    /// Cantidad total de pasos del rango inclusivo.
    pub fn total_steps(&self) -> i64 {
        (self.high_step - self.low_step + 1).max(1)
    }
}

/// Verifica el balance global de llaves del programa.
///
/// Los literales de cadena y los comentarios de línea '#' no aportan
/// estructura.
pub fn validate_program(program_code: &str) -> Result<(), SourceFault> {
    let mut open_block_offsets: Vec<usize> = Vec::new();
    for (byte_offset, structural_char) in structural_chars(program_code) {
        match structural_char {
            '{' => open_block_offsets.push(byte_offset),
            '}' => {
                if open_block_offsets.pop().is_none() {
                    return Err(SourceFault::OrphanedBrace { closed_at: byte_offset });
                }
            }
            _ => {}
        }
    }
    match open_block_offsets.first() {
        Some(&opened_at) => Err(SourceFault::UnbalancedBraces { opened_at }),
        None => Ok(()),
    }
}

/// Nombres de todas las simulaciones declaradas, en orden de aparición.
pub fn list_simulations(program_code: &str) -> Vec<String> {
    SIMULATION_HEADER
        .captures_iter(program_code)
        .map(|header_capture| header_name(&header_capture))
        .collect()
}

/// Localiza el bloque de la simulación pedida.
///
/// # Errors:
/// - `SimulationMissing` si el nombre no aparece en el programa.
/// - `UnbalancedBraces` si el bloque nunca se cierra.
pub fn find_simulation(
    program_code: &str,
    requested_name: &str,
) -> Result<SimulationBlock, SourceFault> {
    for header_capture in SIMULATION_HEADER.captures_iter(program_code) {
        let declared_name = header_name(&header_capture);
        if declared_name != requested_name {
            continue;
        }

        let full_match = header_capture.get(0).expect("capture zero always present");
        let body_start_offset = full_match.end();
        let body_end_offset = matching_close_offset(program_code, body_start_offset)
            .ok_or(SourceFault::UnbalancedBraces { opened_at: full_match.end() - 1 })?;

        return Ok(SimulationBlock {
            simulation_name: declared_name,
            block_body: program_code[body_start_offset..body_end_offset].to_string(),
        });
    }

    Err(SourceFault::SimulationMissing(requested_name.to_string()))
}

/// Conjunto ordenado de variables 'config.*' referenciadas.
pub fn discover_config_variables(program_code: &str) -> BTreeSet<String> {
    CONFIG_REFERENCE
        .captures_iter(program_code)
        .map(|reference_capture| reference_capture["name"].to_string())
        .collect()
}

/// Conjunto ordenado de recursos 'external.*' referenciados: los
/// nombres lógicos que el mapa de datos externos debe satisfacer.
pub fn discover_external_resources(program_code: &str) -> BTreeSet<String> {
    EXTERNAL_REFERENCE
        .captures_iter(program_code)
        .map(|reference_capture| reference_capture["name"].to_string())
        .collect()
}

/// Límites de paso declarados en un cuerpo de simulación.
/// 'steps.low' ausente vale 0; sin 'steps.high' no hay límites.
pub fn step_bounds(block_body: &str) -> Option<StepBounds> {
    let mut declared_low: Option<i64> = None;
    let mut declared_high: Option<i64> = None;

    for bound_capture in STEP_BOUND_ASSIGNMENT.captures_iter(block_body) {
        let bound_value: i64 = bound_capture["value"].parse().ok()?;
        match &bound_capture["edge"] {
            "low" => declared_low = Some(bound_value),
            _ => declared_high = Some(bound_value),
        }
    }

    declared_high.map(|high_step| StepBounds {
        low_step: declared_low.unwrap_or(0),
        high_step,
    })
}

fn header_name(header_capture: &regex::Captures<'_>) -> String {
    header_capture
        .name("quoted")
        .or_else(|| header_capture.name("bare"))
        .map(|name_match| name_match.as_str().to_string())
        .unwrap_or_default()
}

/// Offset de la llave que cierra el bloque abierto justo antes de
/// `body_start_offset`.
fn matching_close_offset(program_code: &str, body_start_offset: usize) -> Option<usize> {
    let mut nesting_depth = 1usize;
    for (byte_offset, structural_char) in structural_chars(program_code) {
        if byte_offset < body_start_offset {
            continue;
        }
        match structural_char {
            '{' => nesting_depth += 1,
            '}' => {
                nesting_depth -= 1;
                if nesting_depth == 0 {
                    return Some(byte_offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Itera los caracteres estructuralmente significativos: fuera de
/// literales de cadena y de comentarios de línea.
fn structural_chars(program_code: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut inside_string_literal = false;
    let mut inside_line_comment = false;

    program_code.char_indices().filter(move |(_, current_char)| {
        if inside_line_comment {
            if *current_char == '\n' {
                inside_line_comment = false;
            }
            return false;
        }
        if inside_string_literal {
            if *current_char == '"' {
                inside_string_literal = false;
            }
            return false;
        }
        match current_char {
            '"' => {
                inside_string_literal = true;
                false
            }
            '#' => {
                inside_line_comment = true;
                false
            }
            _ => true,
        }
    })
}
