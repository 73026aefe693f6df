use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::rules::{ValidationConfig, normalize_header, validate};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    VendorPayables,
    Receivables,
    BankStatement,
    GlMaster,
    CostCenterMaster,
    CounterpartyMaster,
    PurchaseOrder,
    LetterOfCredit,
    SalesOrder,
    GoodsReceipt,
    Creditor,
    Debtor,
}

impl TemplateId {
    pub const ALL: [TemplateId; 12] = [
        Self::VendorPayables,
        Self::Receivables,
        Self::BankStatement,
        Self::GlMaster,
        Self::CostCenterMaster,
        Self::CounterpartyMaster,
        Self::PurchaseOrder,
        Self::LetterOfCredit,
        Self::SalesOrder,
        Self::GoodsReceipt,
        Self::Creditor,
        Self::Debtor,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VendorPayables => "vendor_payables",
            Self::Receivables => "receivables",
            Self::BankStatement => "bank_statement",
            Self::GlMaster => "gl_master",
            Self::CostCenterMaster => "cost_center_master",
            Self::CounterpartyMaster => "counterparty_master",
            Self::PurchaseOrder => "purchase_order",
            Self::LetterOfCredit => "letter_of_credit",
            Self::SalesOrder => "sales_order",
            Self::GoodsReceipt => "goods_receipt",
            Self::Creditor => "creditor",
            Self::Debtor => "debtor",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| ClientError::unknown_template(value))
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    pub id: TemplateId,
    pub title: String,
    pub columns: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
    pub config: Arc<ValidationConfig>,
}

impl Template {
    /// Header plus sample rows, as offered for download.
    pub fn sample_csv(&self) -> ClientResult<String> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
        for row in &self.sample_rows {
            writer
                .write_record(row)
                .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
        String::from_utf8(bytes)
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))
    }

    pub fn sample_file_name(&self) -> String {
        format!("{}_template.csv", self.id.as_str())
    }

    fn check(&self) -> ClientResult<()> {
        let id = self.id.as_str();
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(normalize_header(column)) {
                return Err(ClientError::invalid_template(
                    id,
                    &format!("column `{column}` is declared twice"),
                ));
            }
        }

        let groups = [
            ("required header", &self.config.required_headers),
            ("required field", &self.config.required_fields),
            ("numeric field", &self.config.numeric_fields),
        ];
        for (label, names) in groups {
            if let Some(unknown) = names
                .iter()
                .find(|name| !seen.contains(&normalize_header(name)))
            {
                return Err(ClientError::invalid_template(
                    id,
                    &format!("{label} `{unknown}` is not a declared column"),
                ));
            }
        }

        if self.sample_rows.is_empty() {
            return Err(ClientError::invalid_template(id, "no sample rows"));
        }

        let mut grid = vec![self.columns.clone()];
        grid.extend(self.sample_rows.iter().cloned());
        if let Some(problem) = validate(&grid, &self.config).first() {
            return Err(ClientError::invalid_template(
                id,
                &format!("sample rows do not validate: {}", problem.description),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    /// Builds every built-in template and checks each rule-set once.
    pub fn builtin() -> ClientResult<Self> {
        let templates = TemplateId::ALL
            .into_iter()
            .map(builtin_template)
            .collect::<Vec<Template>>();
        for template in &templates {
            template.check()?;
        }
        Ok(Self { templates })
    }

    pub fn get(&self, id: TemplateId) -> ClientResult<&Template> {
        self.templates
            .iter()
            .find(|template| template.id == id)
            .ok_or_else(|| ClientError::unknown_template(id.as_str()))
    }

    pub fn resolve(&self, slug: &str) -> ClientResult<&Template> {
        self.get(slug.parse::<TemplateId>()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }
}

struct Blueprint<'a> {
    title: &'a str,
    columns: &'a [&'a str],
    optional: &'a [&'a str],
    required_fields: &'a [&'a str],
    numeric_fields: &'a [&'a str],
    sample_rows: &'a [&'a [&'a str]],
}

fn builtin_template(id: TemplateId) -> Template {
    let blueprint = match id {
        TemplateId::VendorPayables => Blueprint {
            title: "Vendor payables",
            columns: &["vendor_name", "invoice", "invoice_date", "due_date", "invoice_amount", "currency"],
            optional: &[],
            required_fields: &["vendor_name", "invoice", "invoice_date", "invoice_amount", "currency"],
            numeric_fields: &["invoice_amount"],
            sample_rows: &[
                &["Acme Metals", "INV-1001", "01/01/2025", "31/01/2025", "125,000.00", "USD"],
                &["Globex GmbH", "INV-1002", "05/01/2025", "04/02/2025", "48,250.75", "EUR"],
            ],
        },
        TemplateId::Receivables => Blueprint {
            title: "Customer receivables",
            columns: &["customer_name", "invoice", "invoice_date", "due_date", "invoice_amount", "currency"],
            optional: &[],
            required_fields: &["customer_name", "invoice", "invoice_date", "invoice_amount", "currency"],
            numeric_fields: &["invoice_amount"],
            sample_rows: &[&["Initech Ltd", "AR-2001", "02/01/2025", "01/03/2025", "75,400.00", "GBP"]],
        },
        TemplateId::BankStatement => Blueprint {
            title: "Bank statement",
            columns: &[
                "account_number",
                "transaction_date",
                "value_date",
                "description",
                "debit",
                "credit",
                "balance",
                "currency",
                "reference",
            ],
            optional: &["reference"],
            required_fields: &["account_number", "transaction_date", "currency"],
            numeric_fields: &["debit", "credit", "balance"],
            sample_rows: &[&[
                "001-445566-01",
                "03/01/2025",
                "03/01/2025",
                "FX settlement EURUSD",
                "10,000.00",
                "",
                "1,250,000.00",
                "USD",
                "FX-88121",
            ]],
        },
        TemplateId::GlMaster => Blueprint {
            title: "General ledger master",
            columns: &["gl_code", "gl_name", "account_type", "currency"],
            optional: &[],
            required_fields: &["gl_code", "gl_name", "account_type"],
            numeric_fields: &[],
            sample_rows: &[&["410100", "FX revaluation gain", "income", "USD"]],
        },
        TemplateId::CostCenterMaster => Blueprint {
            title: "Cost center master",
            columns: &["cost_center_code", "cost_center_name", "department", "owner"],
            optional: &["owner"],
            required_fields: &["cost_center_code", "cost_center_name", "department"],
            numeric_fields: &[],
            sample_rows: &[&["CC-120", "Treasury operations", "Finance", "j.doe"]],
        },
        TemplateId::CounterpartyMaster => Blueprint {
            title: "Counterparty master",
            columns: &["counterparty_code", "counterparty_name", "country", "counterparty_type", "credit_limit"],
            optional: &[],
            required_fields: &["counterparty_code", "counterparty_name", "country", "counterparty_type"],
            numeric_fields: &["credit_limit"],
            sample_rows: &[&["CP-001", "First Harbor Bank", "SG", "bank", "5,000,000"]],
        },
        TemplateId::PurchaseOrder => Blueprint {
            title: "Purchase orders",
            columns: &["po_number", "vendor_name", "po_date", "delivery_date", "amount", "currency"],
            optional: &[],
            required_fields: &["po_number", "vendor_name", "po_date", "amount", "currency"],
            numeric_fields: &["amount"],
            sample_rows: &[&["PO-7781", "Acme Metals", "10/01/2025", "10/02/2025", "32,000.00", "USD"]],
        },
        TemplateId::LetterOfCredit => Blueprint {
            title: "Letters of credit",
            columns: &["lc_number", "beneficiary", "issuing_bank", "issue_date", "expiry_date", "amount", "currency"],
            optional: &[],
            required_fields: &["lc_number", "beneficiary", "issuing_bank", "issue_date", "expiry_date", "amount", "currency"],
            numeric_fields: &["amount"],
            sample_rows: &[&[
                "LC-2025-014",
                "Globex GmbH",
                "First Harbor Bank",
                "15/01/2025",
                "15/07/2025",
                "250,000.00",
                "EUR",
            ]],
        },
        TemplateId::SalesOrder => Blueprint {
            title: "Sales orders",
            columns: &["so_number", "customer_name", "so_date", "delivery_date", "amount", "currency"],
            optional: &[],
            required_fields: &["so_number", "customer_name", "so_date", "amount", "currency"],
            numeric_fields: &["amount"],
            sample_rows: &[&["SO-5510", "Initech Ltd", "12/01/2025", "12/02/2025", "18,900.00", "GBP"]],
        },
        TemplateId::GoodsReceipt => Blueprint {
            title: "Goods receipt notes",
            columns: &["grn_number", "po_number", "receipt_date", "quantity", "amount", "currency"],
            optional: &[],
            required_fields: &["grn_number", "po_number", "receipt_date", "quantity", "amount", "currency"],
            numeric_fields: &["quantity", "amount"],
            sample_rows: &[&["GRN-3302", "PO-7781", "11/02/2025", "400", "32,000.00", "USD"]],
        },
        TemplateId::Creditor => Blueprint {
            title: "Creditor balances",
            columns: &["creditor_code", "creditor_name", "invoice", "invoice_date", "outstanding_amount", "currency"],
            optional: &[],
            required_fields: &["creditor_code", "creditor_name", "invoice", "outstanding_amount", "currency"],
            numeric_fields: &["outstanding_amount"],
            sample_rows: &[&["CR-014", "Acme Metals", "INV-1001", "01/01/2025", "125,000.00", "USD"]],
        },
        TemplateId::Debtor => Blueprint {
            title: "Debtor balances",
            columns: &["debtor_code", "debtor_name", "invoice", "invoice_date", "outstanding_amount", "currency"],
            optional: &[],
            required_fields: &["debtor_code", "debtor_name", "invoice", "outstanding_amount", "currency"],
            numeric_fields: &["outstanding_amount"],
            sample_rows: &[&["DR-220", "Initech Ltd", "AR-2001", "02/01/2025", "75,400.00", "GBP"]],
        },
    };

    let required_headers = blueprint
        .columns
        .iter()
        .copied()
        .filter(|column| !blueprint.optional.contains(column))
        .collect::<Vec<&str>>();

    Template {
        id,
        title: blueprint.title.to_string(),
        columns: blueprint.columns.iter().map(|value| value.to_string()).collect(),
        sample_rows: blueprint
            .sample_rows
            .iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect(),
        config: Arc::new(ValidationConfig::new(
            &required_headers,
            blueprint.required_fields,
            blueprint.numeric_fields,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{TemplateId, TemplateRegistry};

    #[test]
    fn builtin_registry_passes_its_own_checks() {
        let registry = TemplateRegistry::builtin();
        assert!(registry.is_ok(), "{:?}", registry.as_ref().err());
        if let Ok(registry) = registry {
            assert_eq!(registry.iter().count(), TemplateId::ALL.len());
        }
    }

    #[test]
    fn slugs_round_trip_and_unknown_slugs_fail() {
        for id in TemplateId::ALL {
            assert_eq!(id.as_str().parse::<TemplateId>().ok(), Some(id));
        }
        assert_eq!("Vendor-Payables".parse::<TemplateId>().ok(), Some(TemplateId::VendorPayables));

        let unknown = "fx_swaps".parse::<TemplateId>();
        assert!(unknown.is_err());
        if let Err(error) = unknown {
            assert_eq!(error.code, "unknown_template");
        }
    }

    #[test]
    fn payables_rule_set_matches_the_upload_contract() {
        let registry = TemplateRegistry::builtin();
        assert!(registry.is_ok());
        if let Ok(registry) = registry {
            let template = registry.get(TemplateId::VendorPayables);
            assert!(template.is_ok());
            if let Ok(template) = template {
                assert_eq!(template.config.required_headers, template.columns);
                assert_eq!(template.config.numeric_fields, vec!["invoice_amount".to_string()]);
                assert!(!template
                    .config
                    .required_fields
                    .contains(&"due_date".to_string()));
            }
        }
    }

    #[test]
    fn optional_columns_are_not_required_headers() {
        let registry = TemplateRegistry::builtin();
        assert!(registry.is_ok());
        if let Ok(registry) = registry {
            let template = registry.resolve("bank_statement");
            assert!(template.is_ok());
            if let Ok(template) = template {
                assert!(template.columns.contains(&"reference".to_string()));
                assert!(!template.config.required_headers.contains(&"reference".to_string()));
            }
        }
    }

    #[test]
    fn sample_csv_quotes_values_with_commas() {
        let registry = TemplateRegistry::builtin();
        assert!(registry.is_ok());
        if let Ok(registry) = registry {
            let csv = registry
                .get(TemplateId::VendorPayables)
                .and_then(|template| template.sample_csv());
            assert!(csv.is_ok());
            if let Ok(text) = csv {
                let mut lines = text.lines();
                assert_eq!(
                    lines.next(),
                    Some("vendor_name,invoice,invoice_date,due_date,invoice_amount,currency")
                );
                assert_eq!(
                    lines.next(),
                    Some("Acme Metals,INV-1001,01/01/2025,31/01/2025,\"125,000.00\",USD")
                );
            }
        }
    }
}
