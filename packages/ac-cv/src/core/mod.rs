pub mod template_matching;
