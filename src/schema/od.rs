//! Section schema of the motor own-damage (OD) claim report.

use super::{
    FieldDescriptor as F, FieldKind, ReportKind, SectionDescriptor as S, SectionLayout,
    SectionSchema,
};

pub(super) const CLAIM_SUMMARY: &[F] = &[
    F::text("claimNo", "Claim Number"),
    F::text("policyNo", "Policy Number"),
    F::text("insuredName", "Name of Insured"),
    F::text("vehicleNo", "Vehicle Registration No."),
    F::date("dateOfLoss", "Date of Loss"),
    F::text("placeOfLoss", "Place of Loss"),
    F::date("dateOfIntimation", "Date of Intimation"),
    F::text("estimatedLoss", "Estimated Loss Amount"),
    F::text("causeOfLoss", "Cause of Loss"),
];

const INSURED_DRIVER: &[F] = &[
    F::text("insuredName", "Name of Insured"),
    F::text("insuredAddress", "Address of Insured"),
    F::text("insuredContact", "Contact Number"),
    F::text("driverName", "Name of Driver"),
    F::text("relationWithInsured", "Relation with Insured"),
    F::text("driverAddress", "Address of Driver"),
    F::text("licenseNo", "Driving Licence No."),
    F::date("licenseValidity", "Licence Valid Upto"),
    F::text("licenseIssuingAuthority", "Licence Issuing Authority"),
    F::split(
        "eligibleToDrive",
        "Eligible to Drive",
        ("eligibleTransport", "Transport"),
        ("eligibleNonTransport", "Non-Transport"),
    ),
    F::image("driverPhoto", "Photograph of Driver"),
    F::image_pair("licenseImage", "Driving Licence"),
];

const VEHICLE: &[F] = &[
    F::text("registrationNo", "Registration No."),
    F::text("make", "Make"),
    F::text("model", "Model / Variant"),
    F::text("chassisNo", "Chassis No."),
    F::text("engineNo", "Engine No."),
    F::date("dateOfRegistration", "Date of Registration"),
    F::text("fuelType", "Fuel Type"),
    F::text("odometerReading", "Odometer Reading"),
    F::text("permitDetails", "Permit / Fitness Details"),
    F::image_pair("rcImage", "Registration Certificate"),
];

pub(super) const MEETING: &[F] = &[
    F::date("meetingDate", "Date of Meeting"),
    F::text("meetingPlace", "Place of Meeting"),
    F::text("personMet", "Person Met"),
    F::statement("insuredStatement", "Statement of Insured"),
    F::statement("driverStatement", "Statement of Driver"),
];

const POLICY_BREAK_IN: &[F] = &[
    F::text("policyPeriod", "Policy Period"),
    F::text("idv", "Insured Declared Value"),
    F::text("previousInsurer", "Previous Insurer"),
    F::text("previousPolicyNo", "Previous Policy No."),
    F::text("ncbClaimed", "NCB Claimed"),
    F::text("breakInInspection", "Break-in Inspection Done"),
    F::date("breakInDate", "Date of Break-in Inspection"),
    F::text("breakInRemarks", "Break-in Remarks"),
    F::image("policyCopy", "Policy Copy"),
];

const TOWING_VENDOR: &[F] = &[
    F::text("vendorName", "Towing Vendor"),
    F::text("vendorContact", "Contact Number"),
    F::text("towedFrom", "Towed From"),
    F::text("towedTo", "Towed To"),
    F::text("towingCharges", "Towing Charges"),
];

const JOB_CARD: &[F] = &[
    F::text("jobCardNo", "Job Card No."),
    F::date("jobCardDate", "Job Card Date"),
    F::text("odometer", "Odometer at Entry"),
    F::text("estimateAmount", "Estimate Amount"),
    F::text("workDescription", "Work Description"),
];

const GARAGE_VISIT: &[F] = &[
    F::text("garageName", "Name of Garage"),
    F::text("garageAddress", "Address of Garage"),
    F::date("visitDate", "Date of Visit"),
    F::text("vehicleCondition", "Condition of Vehicle"),
    F::text("damagesObserved", "Damages Observed"),
    F::new(
        "towingVendors",
        "Towing Vendor Details",
        FieldKind::Records(TOWING_VENDOR),
    ),
    F::new("jobCard", "Job Card Details", FieldKind::Group(JOB_CARD)),
    F::image("jobCardImage", "Job Card"),
];

pub(super) const POLICE_RECORD: &[F] = &[
    F::text("policeInformed", "Police Informed"),
    F::text("firStatus", "FIR Lodged"),
    F::text("policeStation", "Police Station").when("firStatus", "yes"),
    F::text("firNo", "FIR Number").when("firStatus", "yes"),
    F::text("firDateTime", "FIR Date / Time").when("firStatus", "yes"),
    F::text("district", "District").when("firStatus", "yes"),
    F::text("state", "State").when("firStatus", "yes"),
    F::text("panchnama", "Panchnama / Spot Report"),
    F::text("policeRemarks", "Remarks"),
    F::image("firCopy", "FIR Copy"),
];

pub(super) const WITNESS: &[F] = &[
    F::text("name", "Name of Witness"),
    F::text("address", "Address"),
    F::text("contact", "Contact Number"),
    F::text("relation", "Relation / Occupation"),
    F::statement("witnessStatement", "Statement"),
    F::image("witnessPhoto", "Photograph of Witness"),
    F::image_pair("idProof", "Identity Proof"),
];

pub(super) const OBSERVATIONS: &[F] = &[
    F::new("findings", "Findings", FieldKind::List),
    F::statement("remarks", "Remarks"),
];

pub(super) const ENCLOSURE_OPTIONS: &[&str] = &[
    "Claim Form",
    "Policy Copy",
    "Registration Certificate",
    "Driving Licence",
    "FIR Copy",
    "Statement of Insured",
    "Statement of Driver",
    "Witness Statements",
    "Job Card",
    "Photographs",
];

pub(super) const OPINION: &[F] = &[
    F::statement("opinion", "Opinion"),
    F::new(
        "enclosures",
        "Enclosures",
        FieldKind::Checklist(ENCLOSURE_OPTIONS),
    ),
    F::text("investigatorName", "Investigator"),
    F::text("designation", "Designation"),
    F::text("place", "Place"),
];

const PHOTOS: &[F] = &[
    F::gallery("vehicleImages", "Vehicle Photographs"),
    F::gallery("spotImages", "Spot Photographs"),
    F::gallery("garageImages", "Garage Photographs"),
    F::gallery("documentImages", "Document Photographs"),
    F::gallery("otherImages", "Other Photographs"),
];

pub static OD_SCHEMA: SectionSchema = SectionSchema {
    kind: ReportKind::OdCase,
    sections: &[
        S::new("claimSummary", "Claim Summary", SectionLayout::Table, CLAIM_SUMMARY).always_shown(),
        S::new(
            "insuredDetails",
            "Insured / Driver Details",
            SectionLayout::Table,
            INSURED_DRIVER,
        ),
        S::new("vehicleDetails", "Vehicle Details", SectionLayout::Table, VEHICLE),
        S::new(
            "meetingDetails",
            "Details of meeting with Insured",
            SectionLayout::Narrative,
            MEETING,
        ),
        S::new(
            "policyDetails",
            "Policy & Break-in Details",
            SectionLayout::Table,
            POLICY_BREAK_IN,
        ),
        S::new("garageVisit", "Garage Visit", SectionLayout::Table, GARAGE_VISIT),
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
