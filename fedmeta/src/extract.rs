use crate::{
    descriptor::{ProviderDescriptor, RawDescriptor, Rules},
    diagnostic::{Diagnostic, Sink, TracingSink},
    error::Result,
    xml::{self, Document, Element},
};

/// Extract every valid identity provider from a federation metadata document.
///
/// Descriptors that fail validation are logged and skipped, see
/// [extract_with] to choose the rules and where the diagnostics go.
pub fn extract(document: &str) -> Result<Vec<ProviderDescriptor>> {
    extract_with(document, &Rules::default(), TracingSink)
}

/// Extract every `md:EntityDescriptor` in `document` that passes `rules`.
///
/// The result is in document order and duplicate entity IDs are all kept.
/// Each descriptor is handled on its own: one that fails validation is
/// reported to `sink` (once, listing everything wrong with it) and left out,
/// without affecting its siblings. Elements are matched on their names as
/// written, so a descriptor using undeclared prefixes or unknown entities
/// only affects itself. Only a document that can't be tokenized at all is an
/// error.
#[tracing::instrument(level = "debug", skip(document, sink), fields(len = document.len()))]
pub fn extract_with<S: Sink>(
    document: &str,
    rules: &Rules,
    mut sink: S,
) -> Result<Vec<ProviderDescriptor>> {
    let doc = Document::parse(document)?;

    let descriptors = xml::elements(doc.root(), xml::ENTITY_DESCRIPTOR)
        .map(read_descriptor)
        .enumerate()
        .fold(Vec::new(), |mut valid, (position, raw)| {
            match ProviderDescriptor::validate(raw, rules) {
                Ok(descriptor) => valid.push(descriptor),
                Err(invalid) => sink.emit(Diagnostic::Rejected { position, invalid }),
            }
            valid
        });

    tracing::debug!("Extracted {} entity descriptors", descriptors.len());
    Ok(descriptors)
}

/// Pull the fields we care about out of an `md:EntityDescriptor`.
fn read_descriptor(node: Element) -> RawDescriptor {
    let certificates = xml::elements(node, xml::X509_CERTIFICATE)
        .map(|cert| strip_whitespace(&xml::text_content(cert)))
        .collect();

    RawDescriptor {
        entity_id: xml::attribute(node, "entityID").map(str::to_owned),
        entry_point: service_location(node, xml::SINGLE_SIGN_ON_SERVICE),
        logout_url: service_location(node, xml::SINGLE_LOGOUT_SERVICE),
        certificates,
    }
}

/// `Location` of the first `service` element nested in `node`.
fn service_location(node: Element, service: xml::QName) -> Option<String> {
    xml::first_nested(node, service)
        .and_then(|service| xml::attribute(service, "Location"))
        .map(str::to_owned)
}

/// Certificates are base64 and are often wrapped or indented in metadata.
fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
