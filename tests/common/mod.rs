#![allow(dead_code)]

use chrono::NaiveDate;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use serde_json::json;

use claim_report::config::ImageSettings;
use claim_report::images::embed_image;
use claim_report::{CaseRecord, ImageCache};

pub const FRONT: &str = "https://cdn.example/claims/front.jpg";
pub const REAR: &str = "https://cdn.example/claims/rear.jpg";
pub const SPOT: &str = "https://cdn.example/claims/spot.jpg";
pub const FIR_COPY: &str = "https://cdn.example/claims/fir.jpg";

pub fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Cache holding every image of [`od_case`], as if the materializer had run.
pub fn image_cache() -> ImageCache {
    let settings = ImageSettings::default();
    let mut cache = ImageCache::new();
    for (url, (width, height)) in [
        (FRONT, (1600, 1200)),
        (REAR, (1200, 1600)),
        (SPOT, (640, 480)),
        (FIR_COPY, (900, 1300)),
    ] {
        cache.insert(url, embed_image(&gradient(width, height), &settings).unwrap());
    }
    cache
}

pub fn od_case() -> CaseRecord {
    CaseRecord::from_value(json!({
        "caseId": "OD-2026-0042",
        "referenceNo": "SIA/OD/0042",
        "insurerName": "National Assurance Co. Ltd.",
        "insurerAddress": "Regional Office, MG Road, Pune",
        "claimSummary": {
            "claimNo": "CLM/88/2026",
            "policyNo": "POL-7781",
            "insuredName": "Ravi Kulkarni",
            "vehicleNo": "MH12AB1234",
            "dateOfLoss": "2026-09-02T10:30:00Z",
            "placeOfLoss": "Katraj Ghat",
            "estimatedLoss": "185000"
        },
        "insuredDetails": {
            "insuredName": "Ravi Kulkarni",
            "driverName": "Sunil Pawar",
            "licenseNo": "MH12 20110012345",
            "eligibleToDrive": { "eligibleTransport": "No", "eligibleNonTransport": "Yes" }
        },
        "vehicleDetails": {
            "registrationNo": "MH12AB1234",
            "make": "Maruti Suzuki",
            "model": "Swift VXI"
        },
        "meetingDetails": {
            "meetingDate": "2026-09-10",
            "meetingPlace": "Insured's residence",
            "insuredStatement": "The vehicle skidded on a wet curve.\nNo other vehicle was involved."
        },
        "policeRecord": {
            "policeInformed": "Yes",
            "firStatus": "Yes",
            "policeStation": "Bharati Vidyapeeth",
            "firNo": "412/2026",
            "firCopy": FIR_COPY
        },
        "witnesses": [
            { "name": "Anil Jadhav", "witnessStatement": "Saw the car slide into the barrier." },
            { "name": "Meena Shinde" }
        ],
        "observations": {
            "findings": [
                "Damage is consistent with the reported skid.",
                "Driver held a valid licence on the date of loss."
            ]
        },
        "opinion": {
            "opinion": "The claim appears genuine and may be processed on merits.",
            "enclosures": ["Claim Form", "FIR Copy", "Photographs"],
            "investigatorName": "S. Deshmukh",
            "place": "Pune"
        },
        "photos": {
            "vehicleImages": [
                { "url": FRONT, "title": "Front view" },
                { "url": REAR, "title": "Rear view" },
                "https://cdn.example/claims/unreachable.jpg"
            ],
            "spotImages": [SPOT]
        }
    }))
    .unwrap()
}
