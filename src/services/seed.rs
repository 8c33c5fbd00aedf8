//! Demo catalog: learners, courses with topics and modules, and a few
//! enrollments. Every step checks what exists first, so seeding twice
//! changes nothing.

use tracing::{info, instrument};

use crate::{
    error::{AppError, AppResult},
    models::{
        course::NewCourse,
        money::Money,
        module::NewModule,
        user::{NewUser, Role},
    },
    store::Store,
    utils::hash::hash_password,
};

pub const DEMO_PASSWORD: &str = "password123";

const DEMO_VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

struct DemoUser {
    username: &'static str,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: Role,
    balance_cents: i64,
}

struct DemoModule {
    title: &'static str,
    description: &'static str,
    pdf: Option<&'static str>,
    video: bool,
}

struct DemoCourse {
    title: &'static str,
    description: &'static str,
    instructor: &'static str,
    price_cents: i64,
    topics: &'static [&'static str],
    modules: &'static [DemoModule],
}

const USERS: &[DemoUser] = &[
    DemoUser {
        username: "gro",
        email: "gro@grocademy.com",
        first_name: "Gro",
        last_name: "The Founder",
        role: Role::Admin,
        balance_cents: 1_000_000,
    },
    DemoUser {
        username: "luiy",
        email: "luiy@grocademy.com",
        first_name: "Luiy",
        last_name: "The Wise",
        role: Role::User,
        balance_cents: 500_000,
    },
    DemoUser {
        username: "kebin",
        email: "kebin@nimons.com",
        first_name: "Kebin",
        last_name: "Banana Lover",
        role: Role::User,
        balance_cents: 100_000,
    },
    DemoUser {
        username: "stewart",
        email: "stewart@nimons.com",
        first_name: "Stewart",
        last_name: "The Guitarist",
        role: Role::User,
        balance_cents: 80_000,
    },
    DemoUser {
        username: "pop",
        email: "pop@nimons.com",
        first_name: "Pop",
        last_name: "Unicorn Friend",
        role: Role::User,
        balance_cents: 60_000,
    },
    DemoUser {
        username: "toto",
        email: "toto@nimons.com",
        first_name: "Toto",
        last_name: "Gelato Master",
        role: Role::User,
        balance_cents: 40_000,
    },
    DemoUser {
        username: "neroifa",
        email: "dr.neroifa@chatroifa.ai",
        first_name: "Dr. Neroifa",
        last_name: "AI Creator",
        role: Role::User,
        balance_cents: 5_000_000,
    },
];

const COURSES: &[DemoCourse] = &[
    DemoCourse {
        title: "Banana Economics: From Garden to Market",
        description: "Learn the complete economics of banana cultivation, trade, and market dynamics.",
        instructor: "Dr. Banana Smith",
        price_cents: 4_999,
        topics: &["Economics", "Agriculture", "Market Analysis", "Trade"],
        modules: &[
            DemoModule {
                title: "History of Banana Cultivation",
                description: "Learn about the origins and evolution of banana cultivation worldwide.",
                pdf: Some("banana-history.pdf"),
                video: true,
            },
            DemoModule {
                title: "Global Banana Trade Markets",
                description: "Understanding international banana trade, major exporters and importers.",
                pdf: Some("banana-trade.pdf"),
                video: true,
            },
            DemoModule {
                title: "Banana Price Analysis",
                description: "Learn how to analyze banana prices and market fluctuations.",
                pdf: Some("banana-analysis.pdf"),
                video: false,
            },
        ],
    },
    DemoCourse {
        title: "Guitar Mastery for Beginners",
        description: "Master the art of guitar playing: proper techniques, chord progressions and melodies.",
        instructor: "Stewart The Great",
        price_cents: 7_999,
        topics: &["Music", "Guitar", "Performance", "Arts"],
        modules: &[
            DemoModule {
                title: "Guitar Basics and Setup",
                description: "Learn about guitar parts, tuning, and proper setup.",
                pdf: Some("guitar-basics.pdf"),
                video: true,
            },
            DemoModule {
                title: "Essential Chords for Beginners",
                description: "Master the fundamental chords every guitarist should know.",
                pdf: None,
                video: true,
            },
            DemoModule {
                title: "Strumming Patterns and Rhythm",
                description: "Develop your sense of rhythm and learn various strumming techniques.",
                pdf: Some("strumming-patterns.pdf"),
                video: true,
            },
            DemoModule {
                title: "Your First Song",
                description: "Put it all together and learn to play your first complete song.",
                pdf: None,
                video: true,
            },
        ],
    },
    DemoCourse {
        title: "Mythology and Fantastic Creatures",
        description: "Explore unicorns, dragons, and other mythical creatures and how they inspire storytelling.",
        instructor: "Prof. Unicorn Sparkles",
        price_cents: 5_999,
        topics: &["Mythology", "Fantasy", "Culture", "Storytelling"],
        modules: &[
            DemoModule {
                title: "Introduction to Mythical Creatures",
                description: "Overview of various mythical creatures across different cultures.",
                pdf: Some("mythical-intro.pdf"),
                video: false,
            },
            DemoModule {
                title: "The Magic of Unicorns",
                description: "Deep dive into unicorn mythology and cultural significance.",
                pdf: Some("unicorn-magic.pdf"),
                video: true,
            },
            DemoModule {
                title: "Dragons Across Cultures",
                description: "Explore how different cultures view and portray dragons.",
                pdf: Some("dragons-culture.pdf"),
                video: false,
            },
        ],
    },
    DemoCourse {
        title: "Gelato Making Masterclass",
        description: "From classic flavors to innovative combinations, master the techniques of Italian gelato makers.",
        instructor: "Chef Toto Gelato",
        price_cents: 8_999,
        topics: &["Cooking", "Desserts", "Italian Cuisine", "Food Science"],
        modules: &[
            DemoModule {
                title: "Gelato vs Ice Cream: The Difference",
                description: "Understanding what makes gelato special and different from ice cream.",
                pdf: Some("gelato-difference.pdf"),
                video: true,
            },
            DemoModule {
                title: "Essential Equipment and Ingredients",
                description: "Learn about the tools and ingredients needed for perfect gelato.",
                pdf: Some("gelato-equipment.pdf"),
                video: false,
            },
            DemoModule {
                title: "Classic Vanilla Gelato Recipe",
                description: "Master the fundamental vanilla gelato recipe.",
                pdf: Some("vanilla-gelato.pdf"),
                video: true,
            },
            DemoModule {
                title: "Creative Flavor Combinations",
                description: "Experiment with unique and delicious flavor combinations.",
                pdf: None,
                video: true,
            },
        ],
    },
    DemoCourse {
        title: "Introduction to AI and Machine Learning",
        description: "Understand the fundamentals of artificial intelligence and machine learning.",
        instructor: "Dr. Neroifa",
        price_cents: 19_999,
        topics: &["AI", "Machine Learning", "Technology", "Programming"],
        modules: &[
            DemoModule {
                title: "What is Artificial Intelligence?",
                description: "Introduction to AI concepts and applications.",
                pdf: Some("ai-intro.pdf"),
                video: true,
            },
            DemoModule {
                title: "Machine Learning Fundamentals",
                description: "Basic concepts of machine learning and how it works.",
                pdf: Some("ml-fundamentals.pdf"),
                video: true,
            },
            DemoModule {
                title: "The Story of Chat-ROIFA",
                description: "Learn about the revolutionary Chat-ROIFA and its impact.",
                pdf: None,
                video: true,
            },
        ],
    },
    DemoCourse {
        title: "Digital Platform Development",
        description: "Learn how to build educational platforms: web development, UX design and architecture.",
        instructor: "Gro The Visionary",
        price_cents: 14_999,
        topics: &["Web Development", "Programming", "Technology", "Education"],
        modules: &[],
    },
    DemoCourse {
        title: "Investment Strategies for Creative Minds",
        description: "Investment approaches for creative individuals, skill development and sustainable wealth.",
        instructor: "Luiy The Wise",
        price_cents: 9_999,
        topics: &["Finance", "Investment", "Strategy", "Personal Growth"],
        modules: &[],
    },
    DemoCourse {
        title: "Chaos Management and Organization",
        description: "Turn chaotic environments and randomness into productivity.",
        instructor: "Gro The Organizer",
        price_cents: 6_999,
        topics: &["Management", "Organization", "Leadership", "Psychology"],
        modules: &[],
    },
    DemoCourse {
        title: "Creative Problem Solving",
        description: "Develop innovative approaches to solving complex problems.",
        instructor: "The Nimons Collective",
        price_cents: 7_999,
        topics: &["Critical Thinking", "Innovation", "Creativity", "Strategy"],
        modules: &[],
    },
    DemoCourse {
        title: "Technology Trends and Future Predictions",
        description: "Learn how AI, web platforms, and digital tools are shaping our future.",
        instructor: "Dr. Future Vision",
        price_cents: 12_999,
        topics: &["Technology", "Future", "Innovation", "Trends"],
        modules: &[],
    },
];

/// `(username, course title)` pairs granted without a charge.
const ENROLLMENTS: &[(&str, &str)] = &[
    ("kebin", "Banana Economics: From Garden to Market"),
    ("stewart", "Guitar Mastery for Beginners"),
    ("pop", "Mythology and Fantastic Creatures"),
    ("toto", "Gelato Making Masterclass"),
    ("luiy", "Investment Strategies for Creative Minds"),
    ("neroifa", "Introduction to AI and Machine Learning"),
];

/// What a seeding run created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub courses: usize,
    pub modules: usize,
    pub enrollments: usize,
}

pub struct SeedService<'a> {
    store: &'a dyn Store,
    base_url: &'a str,
}

impl<'a> SeedService<'a> {
    /// `base_url` prefixes the demo PDF references, like uploaded files.
    pub fn new(store: &'a dyn Store, base_url: &'a str) -> Self {
        Self { store, base_url }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> AppResult<SeedReport> {
        let users = self.seed_users().await?;
        let (courses, modules) = self.seed_courses().await?;
        let report = SeedReport {
            users,
            courses,
            modules,
            enrollments: self.seed_enrollments().await?,
        };

        info!(
            users = report.users,
            courses = report.courses,
            modules = report.modules,
            enrollments = report.enrollments,
            "Demo data seeded"
        );
        Ok(report)
    }

    async fn seed_users(&self) -> AppResult<usize> {
        let password_hash = hash_password(DEMO_PASSWORD)?;
        let mut created = 0;

        for demo in USERS {
            if self.store.username_taken(demo.username, None).await?
                || self.store.email_taken(demo.email, None).await?
            {
                continue;
            }

            let user = self
                .store
                .insert_user(NewUser {
                    username: demo.username.to_string(),
                    email: demo.email.to_string(),
                    password_hash: password_hash.clone(),
                    first_name: demo.first_name.to_string(),
                    last_name: demo.last_name.to_string(),
                    role: demo.role,
                })
                .await?;
            self.store
                .add_balance(user.id, Money::from_cents(demo.balance_cents))
                .await?;
            created += 1;
        }

        Ok(created)
    }

    /// Courses are matched by exact title. Modules are only added together
    /// with a newly created course.
    async fn seed_courses(&self) -> AppResult<(usize, usize)> {
        let mut courses = 0;
        let mut modules = 0;

        for demo in COURSES {
            if self.find_course_id(demo.title).await?.is_some() {
                continue;
            }

            let course = self
                .store
                .insert_course(NewCourse {
                    title: demo.title.to_string(),
                    description: demo.description.to_string(),
                    instructor: demo.instructor.to_string(),
                    price: Money::from_cents(demo.price_cents),
                    topics: demo.topics.iter().map(|t| t.to_string()).collect(),
                    thumbnail_image: None,
                })
                .await?;
            courses += 1;

            for module in demo.modules {
                if module.pdf.is_none() && !module.video {
                    return Err(AppError::InternalServerError(format!(
                        "demo module '{}' has no content",
                        module.title
                    )));
                }

                self.store
                    .insert_module(NewModule {
                        course_id: course.id,
                        title: module.title.to_string(),
                        description: module.description.to_string(),
                        pdf_content: module
                            .pdf
                            .map(|file| format!("{}/uploads/modules/pdfs/{}", self.base_url, file)),
                        video_content: module.video.then(|| DEMO_VIDEO.to_string()),
                    })
                    .await?;
                modules += 1;
            }
        }

        Ok((courses, modules))
    }

    async fn seed_enrollments(&self) -> AppResult<usize> {
        let mut created = 0;

        for (username, title) in ENROLLMENTS {
            let Some(user) = self.store.find_user_by_identifier(username).await? else {
                continue;
            };
            let Some(course_id) = self.find_course_id(title).await? else {
                continue;
            };
            if self.store.find_ownership(user.id, course_id).await?.is_some() {
                continue;
            }

            self.store
                .purchase_course(user.id, course_id, Money::ZERO)
                .await?;
            created += 1;
        }

        Ok(created)
    }

    async fn find_course_id(&self, title: &str) -> AppResult<Option<uuid::Uuid>> {
        for id in self.store.course_ids_matching_fields(title).await? {
            let course = self.store.find_course(id).await?;
            if course.is_some_and(|c| c.title == title) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}
