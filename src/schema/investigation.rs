//! Section schema of the general claim investigation report.

use super::od::{MEETING, OBSERVATIONS, OPINION, POLICE_RECORD, WITNESS};
use super::{
    FieldDescriptor as F, ReportKind, SectionDescriptor as S, SectionLayout, SectionSchema,
};

const CASE_SUMMARY: &[F] = &[
    F::text("claimNo", "Claim Number"),
    F::text("policyNo", "Policy Number"),
    F::text("insuredName", "Name of Insured"),
    F::text("claimType", "Type of Claim"),
    F::date("dateOfLoss", "Date of Incident"),
    F::text("placeOfLoss", "Place of Incident"),
    F::text("claimAmount", "Claim Amount"),
    F::text("allegation", "Allegation / Trigger"),
];

const INSURED: &[F] = &[
    F::text("insuredName", "Name of Insured"),
    F::text("age", "Age"),
    F::text("gender", "Gender"),
    F::text("occupation", "Occupation"),
    F::text("address", "Address"),
    F::text("contact", "Contact Number"),
    F::image("photo", "Photograph of Insured"),
    F::image_pair("idProof", "Identity Proof"),
];

const CLAIMANT: &[F] = &[
    F::text("claimantName", "Name of Claimant"),
    F::text("relationWithInsured", "Relation with Insured"),
    F::text("address", "Address"),
    F::text("contact", "Contact Number"),
    F::text("bankDetails", "Bank Details"),
    F::image("photo", "Photograph of Claimant"),
    F::image_pair("idProof", "Identity Proof"),
];

const INCIDENT: &[F] = &[
    F::text("hospitalName", "Hospital / Treating Facility"),
    F::date("admissionDate", "Date of Admission"),
    F::date("dischargeDate", "Date of Discharge"),
    F::text("treatingDoctor", "Treating Doctor"),
    F::text("diagnosis", "Diagnosis / Cause"),
    F::text("billAmount", "Bill Amount"),
    F::statement("incidentNarrative", "Incident Narrative"),
    F::image("dischargeSummary", "Discharge Summary"),
];

const PHOTOS: &[F] = &[
    F::gallery("spotImages", "Spot Photographs"),
    F::gallery("documentImages", "Document Photographs"),
    F::gallery("otherImages", "Other Photographs"),
];

pub static INVESTIGATION_SCHEMA: SectionSchema = SectionSchema {
    kind: ReportKind::Investigation,
    sections: &[
        S::new("caseSummary", "Case Summary", SectionLayout::Table, CASE_SUMMARY).always_shown(),
        S::new("insuredDetails", "Insured Details", SectionLayout::Table, INSURED),
        S::new("claimantDetails", "Claimant Details", SectionLayout::Table, CLAIMANT),
        S::new(
            "incidentDetails",
            "Hospital / Incident Details",
            SectionLayout::Table,
            INCIDENT,
        ),
        S::new(
            "meetingDetails",
            "Details of meeting with Insured",
            SectionLayout::Narrative,
            MEETING,
        ),
        S::new("policeRecord", "Police Record", SectionLayout::Table, POLICE_RECORD),
        S::new("witnesses", "Witness Details", SectionLayout::Narrative, WITNESS).repeated(),
        S::new(
            "observations",
            "Observations & Findings",
            SectionLayout::Findings,
            OBSERVATIONS,
        )
        .page_break_before(),
        S::new("opinion", "Opinion", SectionLayout::Opinion, OPINION)
            .always_shown()
            .page_break_before(),
        S::new("photos", "Photographs", SectionLayout::Photos, PHOTOS),
    ],
};
