//! Sample university catalog
//!
//! Seeds a fresh database and doubles as the fallback dataset.

use crate::models::{Contact, Course, FeeRange, Placements, UniversityProfile};

fn course(name: &str, duration: &str, min: i64, max: i64, intake: &[&str]) -> Course {
    Course {
        name: name.to_string(),
        duration: duration.to_string(),
        fee_range: FeeRange {
            min,
            max,
            currency: "INR".to_string(),
        },
        intake_months: intake.iter().map(|m| m.to_string()).collect(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The universities shipped with the service.
pub fn sample_universities() -> Vec<UniversityProfile> {
    vec![
        UniversityProfile {
            name: "Indian Institute of Technology Delhi".to_string(),
            short_name: "IIT Delhi".to_string(),
            city: "New Delhi".to_string(),
            overview: "IIT Delhi is one of the premier engineering institutions in India, \
                       known for its excellence in teaching and research."
                .to_string(),
            courses: vec![
                course("B.Tech Computer Science", "4 years", 800_000, 1_000_000, &["August"]),
                course("M.Tech Artificial Intelligence", "2 years", 400_000, 500_000, &["July"]),
                course("MBA", "2 years", 1_200_000, 1_500_000, &["June"]),
            ],
            placements: Some(Placements {
                avg_package: "₹18 LPA".to_string(),
                top_recruiters: strings(&["Google", "Microsoft", "Amazon", "Goldman Sachs"]),
                placement_rate: "95%".to_string(),
            }),
            facilities: strings(&["Library", "Hostel", "Sports Complex", "Research Labs", "Cafeteria"]),
            contact: Some(Contact {
                phone: "+91-11-2659-1999".to_string(),
                email: "info@iitd.ac.in".to_string(),
            }),
        },
        UniversityProfile {
            name: "Lovely Professional University".to_string(),
            short_name: "LPU".to_string(),
            city: "Jalandhar, Punjab".to_string(),
            overview: "LPU is a constituent institute of Higher Education, offering quality \
                       education in engineering and technology."
                .to_string(),
            courses: vec![
                course("B.Tech Information Technology", "4 years", 1_400_000, 1_800_000, &["August"]),
                course("B.Tech Mechanical Engineering", "4 years", 1_500_000, 1_700_000, &["August"]),
                course("M.Tech Data Science", "2 years", 600_000, 800_000, &["July", "January"]),
            ],
            placements: Some(Placements {
                avg_package: "₹7.5 LPA".to_string(),
                top_recruiters: strings(&["Infosys", "TCS", "Wipro", "Cognizant"]),
                placement_rate: "88%".to_string(),
            }),
            facilities: strings(&[
                "Library",
                "Hostel",
                "Sports Complex",
                "Medical Facilities",
                "Student Center",
            ]),
            contact: Some(Contact {
                phone: "+91-1824-404404".to_string(),
                email: "admissions@lpu.co.in".to_string(),
            }),
        },
    ]
}
