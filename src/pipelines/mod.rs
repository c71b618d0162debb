// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captured depth samples
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │ Depth Frame  │ ──▶ │ Point Cloud Pipeline │ ──▶ │ PointCloudBatch  │
//! │ Color Frame  │     │  - Depth decode      │     │ (world-space XYZ │
//! │ View Pose    │     │  - Unprojection      │     │  + RGB)          │
//! │ Sample Grid  │     │  - Color sampling    │     │                  │
//! └──────────────┘     └──────────────────────┘     └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`point_cloud`]: Per-job sampling pass and its building blocks

pub mod point_cloud;
