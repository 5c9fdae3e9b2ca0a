//! Sample profile used to pre-populate a fresh session.

use std::collections::BTreeMap;

use crate::models::resume::{
    AchievementEntry, EducationEntry, ExperienceEntry, ProjectEntry, ResumeData, Role, SectionKey,
};

impl ResumeData {
    /// A complete, realistic profile touching every built-in section.
    pub fn sample() -> Self {
        let experience = ExperienceEntry {
            position: Some("Senior Digital Marketing Manager".to_string()),
            location: Some("Kuala Lumpur, Malaysia".to_string()),
            ..ExperienceEntry::new(
                "Media Prima Digital",
                "Senior Digital Marketing Manager",
                "June 2021 - Present",
                "Developed and executed comprehensive digital marketing strategies for major Malaysian media brands\n\
                 Led and mentored a team of 5 content creators, driving 300% increase in social media engagement\n\
                 Spearheaded viral marketing campaigns achieving 5M+ impressions across Southeast Asia\n\
                 Implemented data-driven marketing strategies resulting in 150% ROI for advertising clients\n\
                 Optimized social media content using SEO best practices and analytics tools",
            )
        };

        let education = EducationEntry {
            field: Some("Marketing".to_string()),
            location: Some("Kuala Lumpur, Malaysia".to_string()),
            description: Some("CGPA: 3.8/4.0\nVice President of Marketing Society".to_string()),
            ..EducationEntry::new(
                "Universiti Malaya",
                "Bachelor of Business Administration",
                "August 2017 - May 2021",
            )
        };

        let project = ProjectEntry::new(
            "Ramadan & Raya Digital Marketing Campaign 2023",
            "Led end-to-end digital marketing strategy for nationwide festive campaign. \
             Utilized multi-channel approach including social media, influencer partnerships, and paid advertising. \
             Achieved 2M+ impressions and 400% increase in brand engagement metrics.",
        );

        let achievement = AchievementEntry {
            date: Some("November 2022".to_string()),
            ..AchievementEntry::new(
                "Digital Marketing Excellence Award - Malaysia 2022",
                "Gold award recipient for Best Integrated Social Media Campaign, recognized for \
                 innovative digital marketing strategies and measurable business impact.",
            )
        };

        let section_titles: BTreeMap<SectionKey, String> = SectionKey::ALL
            .iter()
            .map(|k| (*k, k.default_title().to_string()))
            .collect();
        let visible_sections: BTreeMap<SectionKey, bool> =
            SectionKey::ALL.iter().map(|k| (*k, true)).collect();

        ResumeData {
            name: "John Doe".to_string(),
            email: "john.doe@gmail.com".to_string(),
            phone: "+60 12-345 6789".to_string(),
            location: "Kuala Lumpur, Malaysia".to_string(),
            link: Some("https://linkedin.com/in/johndoe".to_string()),
            profile_image: None,
            roles: vec![
                Role::new("Digital Marketing Manager"),
                Role::new("Social Media Strategist"),
            ],
            summary: "Results-driven Digital Marketing Manager with 5+ years of experience in developing \
                      and executing comprehensive marketing strategies. Proven track record of increasing \
                      brand visibility, engagement, and ROI through data-driven campaigns and innovative \
                      social media initiatives. Skilled in leading cross-functional teams and adapting to \
                      rapidly evolving digital landscapes."
                .to_string(),
            experience: vec![experience],
            education: vec![education],
            projects: vec![project],
            achievements: vec![achievement],
            skills: [
                "Digital Marketing Strategy",
                "Social Media Marketing",
                "Content Strategy",
                "Campaign Management",
                "Marketing Analytics",
                "SEO/SEM",
                "Performance Marketing",
                "Brand Development",
                "Team Leadership",
                "Adobe Creative Suite",
                "Google Analytics",
                "Meta Ads Manager",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            languages: [
                "English (Professional)",
                "Bahasa Malaysia (Native)",
                "Mandarin (Conversational)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            section_titles,
            visible_sections,
            custom_sections: Vec::new(),
        }
    }
}
