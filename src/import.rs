use serde::Serialize;

use crate::crm::Stage;
use crate::util::fold;

/// CRM lead fields an imported spreadsheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    Phone,
    Email,
    Source,
    Stage,
    Value,
    Interest,
    Notes,
}

// Header synonyms per field, in folded form. Field order is the assignment
// priority; within a pass, the first untaken matching column wins.
static FIELD_SYNONYMS: &[(LeadField, &[&str])] = &[
    (LeadField::Name, &["nome", "cliente", "nome completo", "contato", "name"]),
    (LeadField::Phone, &["telefone", "celular", "fone", "whatsapp", "phone", "tel"]),
    (LeadField::Email, &["email", "e-mail", "mail"]),
    (LeadField::Source, &["origem", "fonte", "canal", "source", "midia"]),
    (LeadField::Stage, &["etapa", "estagio", "fase", "status", "stage"]),
    (LeadField::Value, &["valor", "orcamento", "budget", "preco"]),
    (LeadField::Interest, &["interesse", "imovel", "empreendimento", "produto"]),
    (LeadField::Notes, &["observacoes", "observacao", "obs", "notas", "nota", "comentarios", "comentario"]),
];

/// One resolved column assignment.
#[derive(Debug, Clone, Serialize)]
pub struct MappedColumn {
    pub column: usize,
    pub header: String,
    pub field: LeadField,
}

/// Result of the header auto-mapping pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnMap {
    pub mapped: Vec<MappedColumn>,
    pub unmapped: Vec<String>,
}

impl ColumnMap {
    fn column_for(&self, field: LeadField) -> Option<usize> {
        self.mapped
            .iter()
            .find(|m| m.field == field)
            .map(|m| m.column)
    }
}

/// Heuristically map spreadsheet headers to lead fields.
///
/// Headers are folded before matching. An exact-synonym pass runs before a
/// containment pass so "telefone" beats "telefone residencial" for the Phone
/// slot; each field is assigned at most once.
pub fn map_columns(headers: &[String]) -> ColumnMap {
    let folded: Vec<String> = headers
        .iter()
        .map(|h| fold(h).trim().to_string())
        .collect();

    let mut taken = vec![false; headers.len()];
    let mut mapped: Vec<MappedColumn> = Vec::new();

    for exact in [true, false] {
        for (field, synonyms) in FIELD_SYNONYMS {
            if mapped.iter().any(|m| m.field == *field) {
                continue;
            }
            let hit = folded.iter().enumerate().position(|(i, header)| {
                !taken[i]
                    && synonyms.iter().any(|s| {
                        if exact {
                            header.as_str() == *s
                        } else {
                            header.contains(s)
                        }
                    })
            });
            if let Some(i) = hit {
                taken[i] = true;
                mapped.push(MappedColumn {
                    column: i,
                    header: headers[i].clone(),
                    field: *field,
                });
            }
        }
    }

    let unmapped = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !taken[*i])
        .map(|(_, h)| h.clone())
        .collect();

    mapped.sort_by_key(|m| m.column);
    ColumnMap { mapped, unmapped }
}

/// A lead assembled from one spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportedLead {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Build leads from data rows using a column map.
/// Rows with neither a name nor a phone are skipped.
pub fn rows_to_leads(map: &ColumnMap, rows: &[Vec<String>]) -> Vec<ImportedLead> {
    let cell = |row: &[String], field: LeadField| -> Option<String> {
        let i = map.column_for(field)?;
        let value = row.get(i)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    };

    let mut leads = Vec::new();
    for row in rows {
        let name = cell(row, LeadField::Name);
        let phone = cell(row, LeadField::Phone);
        if name.is_none() && phone.is_none() {
            continue;
        }

        leads.push(ImportedLead {
            name,
            phone,
            email: cell(row, LeadField::Email),
            source: cell(row, LeadField::Source),
            stage: cell(row, LeadField::Stage).and_then(|s| Stage::parse(&s)),
            value: cell(row, LeadField::Value).and_then(|v| parse_brl(&v)),
            interest: cell(row, LeadField::Interest),
            notes: cell(row, LeadField::Notes),
        });
    }
    leads
}

/// Parse a Brazilian-formatted currency cell ("R$ 350.000,00", "350000").
pub fn parse_brl(text: &str) -> Option<f64> {
    let folded = fold(text);
    let cleaned: String = folded
        .trim_start()
        .trim_start_matches("r$")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    // With a comma present, dots are thousands separators; without one,
    // dot-groups of three digits still read as thousands ("350.000").
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if looks_like_thousands(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    normalized.parse().ok()
}

fn looks_like_thousands(text: &str) -> bool {
    let mut parts = text.split('.');
    let Some(first) = parts.next() else {
        return false;
    };
    let rest: Vec<&str> = parts.collect();
    !first.is_empty() && !rest.is_empty() && rest.iter().all(|p| p.len() == 3)
}
