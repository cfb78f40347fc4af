//! Fixed-layout rendering for stored documents. Layout is computed as a pure
//! [`DocumentSheet`] (deterministic in the document's field values, one line
//! per non-null field) and then encoded to PDF. No network or storage access.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::config::BusinessConfig;
use crate::workflows::accounts::Child;

use super::domain::{ChildRecord, ConsentForm, Contract, Document, Signatures};

/// PDF generation failure. Fatal to the enclosing workflow step; no partial
/// output is returned.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pdf encoding failed: {0}")]
    Encode(String),
}

/// One row of a rendered sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetLine {
    Heading(String),
    Field { label: String, value: String },
}

/// Deterministic layout model for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSheet {
    pub title: String,
    pub lines: Vec<SheetLine>,
}

impl DocumentSheet {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    fn heading(&mut self, text: &str) {
        self.lines.push(SheetLine::Heading(text.to_string()));
    }

    fn field(&mut self, label: &str, value: &str) {
        self.lines.push(SheetLine::Field {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    fn optional(&mut self, label: &str, value: Option<&String>) {
        if let Some(value) = value {
            self.field(label, value);
        }
    }

    /// Every field value on the sheet, for assertions and summaries.
    pub fn values(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                SheetLine::Field { value, .. } => Some(value.as_str()),
                SheetLine::Heading(_) => None,
            })
            .collect()
    }

    /// Plain-text projection of the sheet, used for golden comparisons.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        for line in &self.lines {
            match line {
                SheetLine::Heading(text) => {
                    out.push('\n');
                    out.push_str(text);
                    out.push('\n');
                }
                SheetLine::Field { label, value } => {
                    out.push_str(&format!("{label}: {value}\n"));
                }
            }
        }
        out
    }
}

/// Build the layout sheet for a stored document.
pub fn document_sheet(
    document: &Document,
    child: &Child,
    business: &BusinessConfig,
) -> DocumentSheet {
    match document {
        Document::Contract(contract) => contract_sheet(contract, child, business),
        Document::Consent(consent) => consent_sheet(consent, child, business),
        Document::Record(record) => record_sheet(record, child, business),
    }
}

/// Render a stored document straight to PDF bytes.
pub fn render_document(
    document: &Document,
    child: &Child,
    business: &BusinessConfig,
) -> Result<Vec<u8>, RenderError> {
    encode_pdf(&document_sheet(document, child, business))
}

fn child_header(sheet: &mut DocumentSheet, child: &Child, business: &BusinessConfig) {
    sheet.field("Setting", &business.trading_name);
    sheet.field("Child", &child.full_name());
    sheet.field("Date of birth", &child.dob.format("%d/%m/%Y").to_string());
}

fn signature_block(sheet: &mut DocumentSheet, signatures: &Signatures) {
    sheet.heading("Agreement");
    sheet.field("Parent/guardian signature", &signatures.parent_signature);
    sheet.field(
        "Parent/guardian signed at",
        &signatures.parent_signed_at.to_rfc3339(),
    );
    if let Some(ip) = signatures.parent_ip {
        sheet.field("Signed from address", &ip.to_string());
    }
    sheet.field("Childminder signature", &signatures.childminder_signature);
    sheet.field(
        "Childminder signed at",
        &signatures.childminder_signed_at.to_rfc3339(),
    );
}

fn contract_sheet(contract: &Contract, child: &Child, business: &BusinessConfig) -> DocumentSheet {
    let mut sheet = DocumentSheet::new("Childminding Contract");
    child_header(&mut sheet, child, business);
    sheet.field("Contract start date", &child.contract_start_date_display());
    sheet.field("Contracted days", &child.contracted_days_display());

    sheet.heading("Parental responsibility");
    sheet.field("Parent 1 name", &contract.parent1_name);
    sheet.field("Parent 1 address", &contract.parent1_address);
    sheet.optional("Parent 1 home phone", contract.parent1_telephone_home.as_ref());
    sheet.optional("Parent 1 work phone", contract.parent1_telephone_work.as_ref());
    sheet.optional(
        "Parent 1 mobile phone",
        contract.parent1_telephone_mobile.as_ref(),
    );
    sheet.optional("Parent 2 name", contract.parent2_name.as_ref());
    sheet.optional("Parent 2 address", contract.parent2_address.as_ref());
    sheet.optional("Parent 2 home phone", contract.parent2_telephone_home.as_ref());
    sheet.optional("Parent 2 work phone", contract.parent2_telephone_work.as_ref());
    sheet.optional(
        "Parent 2 mobile phone",
        contract.parent2_telephone_mobile.as_ref(),
    );
    sheet.optional("Additional legal contact", contract.legal_contact.as_ref());

    sheet.heading("Collection");
    sheet.field("Authorised collectors", &contract.authorised_collectors);
    sheet.field("Collection password", &contract.collection_password);

    sheet.heading("Fees");
    sheet.field("Daily fee", &format!("GBP {} per day", contract.day_fee_gbp));

    signature_block(&mut sheet, &contract.signatures);
    sheet
}

fn consent_sheet(consent: &ConsentForm, child: &Child, business: &BusinessConfig) -> DocumentSheet {
    let mut sheet = DocumentSheet::new("Consent Form");
    child_header(&mut sheet, child, business);

    sheet.heading("Consents");
    sheet.field("Policies and procedures", &consent.policies_signature);
    sheet.field("Complaints procedure", &consent.complaints_signature);
    sheet.field("Emergency medical treatment", &consent.emergency_signature);
    sheet.field(
        "Emergency caregiver",
        &consent.emergency_caregiver_signature,
    );
    sheet.field("Outings", &consent.outings_signature);
    sheet.field("Photographs", &consent.photos_signature);
    sheet.field("Transport", &consent.transport_signature);
    sheet.field("Equipment", &consent.equipment_signature);
    sheet.field("First aid", &consent.firstaid_signature);
    sheet.field("Information sharing", &consent.sharing_signature);
    sheet.field("Plasters", &consent.plaster_signature);
    sheet.field("Suncream and wipes", &consent.suncream_wipes_signature);
    sheet.field("Calpol", &consent.calpol_signature);

    signature_block(&mut sheet, &consent.signatures);
    sheet
}

fn record_sheet(record: &ChildRecord, child: &Child, business: &BusinessConfig) -> DocumentSheet {
    let mut sheet = DocumentSheet::new("Child Record");
    child_header(&mut sheet, child, business);

    sheet.heading("Home");
    sheet.field("Home address", &record.home_address);
    sheet.field("Languages spoken at home", &record.languages_spoken);
    sheet.optional(
        "Religious or cultural needs",
        record.religion_cultural_needs.as_ref(),
    );

    sheet.heading("Health");
    sheet.field("Doctor", &record.doctor_name);
    sheet.field("Surgery", &record.doctor_surgery);
    sheet.field("Surgery phone", &record.doctor_phone);
    sheet.optional("Medical conditions", record.medical_conditions.as_ref());
    sheet.optional("Allergies", record.allergies.as_ref());
    sheet.optional("Dietary needs", record.dietary_needs.as_ref());
    sheet.optional("Medication", record.medication.as_ref());
    sheet.optional("Vaccinations", record.vaccinations.as_ref());

    sheet.heading("Emergency contacts");
    sheet.field("Contact 1 name", &record.emergency_contact1_name);
    sheet.field(
        "Contact 1 relationship",
        &record.emergency_contact1_relationship,
    );
    sheet.field("Contact 1 phone", &record.emergency_contact1_phone);
    sheet.optional("Contact 2 name", record.emergency_contact2_name.as_ref());
    sheet.optional(
        "Contact 2 relationship",
        record.emergency_contact2_relationship.as_ref(),
    );
    sheet.optional("Contact 2 phone", record.emergency_contact2_phone.as_ref());

    sheet.optional("Additional notes", record.additional_notes.as_ref());

    signature_block(&mut sheet, &record.signatures);
    sheet
}

/// Encode a sheet into A4 PDF bytes: title, then label/value rows grouped
/// under their headings, paginating when a page fills.
pub fn encode_pdf(sheet: &DocumentSheet) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(sheet.title.clone(), Mm(210.0), Mm(297.0), "content");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| RenderError::Encode(err.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| RenderError::Encode(err.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = 277.0;

    layer.use_text(sheet.title.clone(), 16.0, Mm(20.0), Mm(y), &bold);
    y -= 12.0;

    for line in &sheet.lines {
        if y < 20.0 {
            let (page, new_layer) = doc.add_page(Mm(210.0), Mm(297.0), "content");
            layer = doc.get_page(page).get_layer(new_layer);
            y = 277.0;
        }

        match line {
            SheetLine::Heading(text) => {
                y -= 4.0;
                layer.use_text(text.clone(), 12.0, Mm(20.0), Mm(y), &bold);
                y -= 8.0;
            }
            SheetLine::Field { label, value } => {
                layer.use_text(format!("{label}:"), 10.0, Mm(20.0), Mm(y), &regular);
                layer.use_text(value.clone(), 10.0, Mm(85.0), Mm(y), &regular);
                y -= 6.0;
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|err| RenderError::Encode(err.to_string()))
}
